// src/scan/filter.rs
// =============================================================================
// Status-code filtering of probe results.
//
// Specs are comma-separated codes and inclusive ranges:
//   "200"          -> 200
//   "301-302"      -> 301, 302
//   "200,500-599"  -> 200 and every 5xx
// Parts that don't parse are ignored.
//
// A result is retained unless
//   (a) an include list is configured and the status matches none of it, or
//   (b) the status matches any exclude spec.
// Exclusion wins when both apply. Results without a status (transport
// errors) match no spec.
// =============================================================================

use crate::config::GeneralConfig;

/// Inclusive range of status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub start: u16,
    pub end: u16,
}

impl StatusRange {
    pub fn contains(&self, code: u16) -> bool {
        self.start <= code && code <= self.end
    }
}

/// Parses one status spec string into ranges
pub fn parse_status_codes(spec: &str) -> Vec<StatusRange> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse().ok()?;
                let end = end.trim().parse().ok()?;
                Some(StatusRange { start, end })
            }
            None => {
                let code = part.parse().ok()?;
                Some(StatusRange { start: code, end: code })
            }
        })
        .collect()
}

fn parse_all(specs: &[String]) -> Vec<StatusRange> {
    specs.iter().flat_map(|s| parse_status_codes(s)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct StatusFilter {
    include: Option<Vec<StatusRange>>,
    exclude: Vec<StatusRange>,
}

impl StatusFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        let has_include = include.iter().any(|s| !s.trim().is_empty());
        Self {
            include: has_include.then(|| parse_all(include)),
            exclude: parse_all(exclude),
        }
    }

    pub fn from_config(general: &GeneralConfig) -> Self {
        Self::new(&general.include_status, &general.exclude_status)
    }

    pub fn retains(&self, status: Option<u16>) -> bool {
        let matches = |ranges: &[StatusRange]| status.map_or(false, |code| ranges.iter().any(|r| r.contains(code)));

        if let Some(include) = &self.include {
            if !matches(include) {
                return false;
            }
        }
        !matches(&self.exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn survivors(filter: &StatusFilter, codes: &[u16]) -> Vec<u16> {
        codes.iter().copied().filter(|c| filter.retains(Some(*c))).collect()
    }

    #[test]
    fn test_parse_codes_and_ranges() {
        assert_eq!(
            parse_status_codes("200, 301-302,abc, 5x0-599,"),
            vec![
                StatusRange { start: 200, end: 200 },
                StatusRange { start: 301, end: 302 },
            ]
        );
    }

    #[test]
    fn test_include_and_exclude() {
        let codes = [200, 301, 302, 404];

        let include_only = StatusFilter::new(&specs(&["200", "301-302"]), &[]);
        assert_eq!(survivors(&include_only, &codes), vec![200, 301, 302]);

        let with_exclude = StatusFilter::new(&specs(&["200", "301-302"]), &specs(&["301"]));
        assert_eq!(survivors(&with_exclude, &codes), vec![200, 302]);
    }

    #[test]
    fn test_no_filters_keep_everything() {
        let filter = StatusFilter::default();
        assert!(filter.retains(Some(404)));
        assert!(filter.retains(None));
    }

    #[test]
    fn test_exclude_only() {
        let filter = StatusFilter::new(&[], &specs(&["400-499"]));
        assert_eq!(survivors(&filter, &[200, 403, 404, 500]), vec![200, 500]);
        assert!(filter.retains(None));
    }

    #[test]
    fn test_include_drops_errored_results() {
        let filter = StatusFilter::new(&specs(&["200"]), &[]);
        assert!(!filter.retains(None));
    }

    #[test]
    fn test_unparseable_include_retains_nothing() {
        let filter = StatusFilter::new(&specs(&["oops"]), &[]);
        assert!(!filter.retains(Some(200)));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let filter = StatusFilter::new(&[], &specs(&["302-301"]));
        assert!(filter.retains(Some(301)));
    }
}
