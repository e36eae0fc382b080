//! Street name index: list, validate, complete.

use serde::Serialize;
use tabled::Tabled;

use peakmap_core::{ServiceConfig, StreetIndex, StreetValidity};

use crate::cli::{GlobalOpts, StreetsArgs};
use crate::error::CliError;
use crate::output;

use super::load_layers;

#[derive(Serialize)]
struct StreetCheck {
    input: String,
    validity: StreetValidity,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

#[derive(Tabled)]
struct StreetRow {
    #[tabled(rename = "Street")]
    name: String,
}

pub async fn handle(service: &ServiceConfig, args: StreetsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let layers = load_layers(service).await?;
    let index = StreetIndex::load(&layers).await;

    let out = if let Some(input) = args.check {
        let check = StreetCheck {
            validity: index.validate(&input),
            suggestion: None,
            input,
        };
        let color = output::should_color(&global.color);
        output::render_single(
            &global.output,
            &check,
            |c| {
                let ok = c.validity != StreetValidity::Unknown;
                format!("{}: {}", c.input.trim(), output::status(&c.validity.to_string(), ok, color))
            },
            |c| c.validity.to_string(),
        )?
    } else if let Some(input) = args.complete {
        let check = StreetCheck {
            validity: index.validate(&input),
            suggestion: index.complete(&input).map(str::to_owned),
            input,
        };
        output::render_single(
            &global.output,
            &check,
            |c| c.suggestion.clone().unwrap_or_else(|| c.input.trim().to_owned()),
            |c| c.suggestion.clone().unwrap_or_else(|| c.input.trim().to_owned()),
        )?
    } else {
        output::render_list(
            &global.output,
            index.names(),
            |name| StreetRow { name: name.clone() },
            Clone::clone,
        )?
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
