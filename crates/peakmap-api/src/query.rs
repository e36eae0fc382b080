// ── Layer query parameters ──
//
// Builder for the `/query` endpoint's form parameters.

/// Parameters for a single layer query.
///
/// `where_clause` is passed verbatim; callers are responsible for producing
/// a valid SQL-92 subset expression (see `peakmap_core::predicate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub where_clause: String,
    pub out_fields: Vec<String>,
    pub return_geometry: bool,
    pub return_distinct_values: bool,
    /// Output spatial reference WKID for returned geometry.
    pub out_sr: Option<u32>,
    pub result_offset: Option<u64>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            where_clause: "1=1".into(),
            out_fields: vec!["*".into()],
            return_geometry: false,
            return_distinct_values: false,
            out_sr: None,
            result_offset: None,
        }
    }
}

impl QueryRequest {
    /// Full-attribute query, optionally with geometry.
    pub fn features(where_clause: impl Into<String>, return_geometry: bool) -> Self {
        Self {
            where_clause: where_clause.into(),
            return_geometry,
            ..Self::default()
        }
    }

    /// Distinct-values query over the given fields, never with geometry.
    pub fn distinct<S: AsRef<str>>(where_clause: impl Into<String>, fields: &[S]) -> Self {
        Self {
            where_clause: where_clause.into(),
            out_fields: fields.iter().map(|f| f.as_ref().to_owned()).collect(),
            return_distinct_values: true,
            ..Self::default()
        }
    }

    pub fn with_out_sr(mut self, wkid: u32) -> Self {
        self.out_sr = Some(wkid);
        self
    }

    /// Same request, starting at `offset` (paging past the transfer limit).
    pub fn at_offset(&self, offset: u64) -> Self {
        Self {
            result_offset: Some(offset),
            ..self.clone()
        }
    }

    /// Render as `(key, value)` form pairs, `f=json` included.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("where", self.where_clause.clone()),
            ("outFields", self.out_fields.join(",")),
            ("returnGeometry", self.return_geometry.to_string()),
        ];
        if self.return_distinct_values {
            params.push(("returnDistinctValues", "true".into()));
        }
        if let Some(sr) = self.out_sr {
            params.push(("outSR", sr.to_string()));
        }
        if let Some(offset) = self.result_offset {
            params.push(("resultOffset", offset.to_string()));
        }
        params.push(("f", "json".into()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_query_params() {
        let req = QueryRequest::distinct("Data_Type = 'AM Peak'", &["Year"]);
        let params = req.to_params();
        assert!(params.contains(&("where", "Data_Type = 'AM Peak'".into())));
        assert!(params.contains(&("outFields", "Year".into())));
        assert!(params.contains(&("returnDistinctValues", "true".into())));
        assert!(params.contains(&("returnGeometry", "false".into())));
        assert_eq!(params.last(), Some(&("f", "json".into())));
    }

    #[test]
    fn feature_query_with_geometry_and_offset() {
        let req = QueryRequest::features("1=1", true).with_out_sr(3857).at_offset(2000);
        let params = req.to_params();
        assert!(params.contains(&("outFields", "*".into())));
        assert!(params.contains(&("returnGeometry", "true".into())));
        assert!(params.contains(&("outSR", "3857".into())));
        assert!(params.contains(&("resultOffset", "2000".into())));
        assert!(!params.iter().any(|(k, _)| *k == "returnDistinctValues"));
    }
}
