//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use crate::curfew::TimeWindow;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Tables whose keys are user data (connection ids), not field names.
const FREE_FORM_TABLES: &[&str] = &["reload_adapters.intervals"];

/// Returns the complete set of valid dotted key paths for MonitorConfig.
///
/// Entries of `[[curfew]]` are reported under the `curfew` prefix.
/// Any new field added to MonitorConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "notify_sid",
        "notify_target",
        "ping",
        "reload_on_disconnect",
        "reload_on_disconnect_delay_ms",
        "sandbox_platform_prefix",
        // [reload_adapters]
        "reload_adapters",
        "reload_adapters.retries",
        "reload_adapters.check_interval_ms",
        "reload_adapters.intervals",
        // [[curfew]]
        "curfew",
        "curfew.start",
        "curfew.end",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside an array share the array's path,
/// and free-form tables are not descended into.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if FREE_FORM_TABLES.contains(&path.as_str()) {
                continue;
            }
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for nested in walk_toml_keys(item, &path) {
                            if !keys.contains(&nested) {
                                keys.push(nested);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties broken alphabetically so suggestions are stable.
        let better = match best {
            None => true,
            Some((bk, bd)) => dist < bd || (dist == bd && k < bk),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed MonitorConfig.
///
/// Returns (errors, warnings). Errors must prevent startup; warnings are
/// suspicious but not fatal.
pub fn validate_ranges(config: &super::MonitorConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, marker) in config.curfew.iter().enumerate() {
        let start = crate::curfew::marker_to_minutes(&marker.start);
        let end = crate::curfew::marker_to_minutes(&marker.end);
        if let Err(ref e) = start {
            errors.push(format!("curfew[{i}].start: {e}"));
        }
        if let Err(ref e) = end {
            errors.push(format!("curfew[{i}].end: {e}"));
        }
        if let (Ok(start), Ok(end)) = (start, end) {
            if TimeWindow::new(start, end).is_permanently_closed() {
                warnings.push(ValidationWarning {
                    field: format!("curfew[{i}]"),
                    message: format!(
                        "curfew[{i}] {}-{} never opens \
                         (start must be before end, windows cannot span midnight)",
                        marker.start, marker.end
                    ),
                    suggestion: None,
                });
            }
        }
    }

    let ra = &config.reload_adapters;
    for (id, threshold) in &ra.intervals {
        if *threshold == 0 {
            errors.push(format!(
                "reload_adapters.intervals.\"{id}\" = 0 must be > 0 (idle threshold in ms)"
            ));
        }
    }

    if config.reload_on_disconnect && config.reload_on_disconnect_delay_ms == 0 {
        errors.push(
            "reload_on_disconnect_delay_ms must be > 0 when reload_on_disconnect is enabled"
                .to_string(),
        );
    }

    if ra.check_interval_ms > 0 && ra.intervals.is_empty() {
        warnings.push(ValidationWarning {
            field: "reload_adapters.intervals".to_string(),
            message: "reload_adapters.check_interval_ms is set but no connection has an \
                      idle threshold; the health check has nothing to watch"
                .to_string(),
            suggestion: None,
        });
    }

    match (&config.notify_sid, &config.notify_target) {
        (Some(_), None) | (None, Some(_)) => warnings.push(ValidationWarning {
            field: "notify_target".to_string(),
            message: "notify_sid and notify_target must both be set for notifications to be sent"
                .to_string(),
            suggestion: None,
        }),
        _ => {}
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::connection::ConnectionId;
    use crate::curfew::MarkerWindow;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("retries", "retries"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("retires", "retries"), 2);
        assert_eq!(levenshtein("retrie", "retries"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [reload_adapters]
            retries = 2
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"reload_adapters".to_string()));
        assert!(keys.contains(&"reload_adapters.retries".to_string()));
    }

    #[test]
    fn test_walk_skips_free_form_intervals() {
        let toml: toml::Value = r#"
            [reload_adapters.intervals]
            "onebot:1" = 1000
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"reload_adapters.intervals".to_string()));
        assert!(!keys.iter().any(|k| k.contains("onebot")));
    }

    #[test]
    fn test_walk_array_of_tables_dedups() {
        let toml: toml::Value = r#"
            [[curfew]]
            start = "1:00"
            end = "2:00"
            [[curfew]]
            start = "3:00"
            end = "4:00"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert_eq!(keys.iter().filter(|k| *k == "curfew.start").count(), 1);
        assert!(keys.contains(&"curfew.end".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[reload_adapters]\nretrie = 3\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "reload_adapters.retrie");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("reload_adapters.retries")
        );
    }

    #[test]
    fn test_typo_in_curfew_entry() {
        let warnings = validate_unknown_keys("[[curfew]]\nstrat = \"1:00\"\nend = \"2:00\"\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].suggestion.as_deref(), Some("curfew.start"));
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_ranges_defaults_clean_except_idle_warning() {
        let (errors, warnings) = validate_ranges(&MonitorConfig::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {errors:?}");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "reload_adapters.intervals");
    }

    #[test]
    fn test_ranges_zero_threshold_is_error() {
        let mut config = MonitorConfig::default();
        config
            .reload_adapters
            .intervals
            .insert(ConnectionId::from("onebot:1"), 0);
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("onebot:1")));
    }

    #[test]
    fn test_ranges_inverted_window_warns() {
        let mut config = MonitorConfig::default();
        config.curfew.push(MarkerWindow::new("23:00", "1:00"));
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "curfew[0]"));
    }

    #[test]
    fn test_ranges_bad_markers_are_errors() {
        let mut config = MonitorConfig::default();
        config.curfew.push(MarkerWindow::new("7:5", "12:61"));
        let (errors, _) = validate_ranges(&config);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("curfew[0].start"));
        assert!(errors[1].starts_with("curfew[0].end"));
    }

    #[test]
    fn test_ranges_zero_disconnect_delay() {
        let mut config = MonitorConfig::default();
        config.reload_on_disconnect = true;
        config.reload_on_disconnect_delay_ms = 0;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("reload_on_disconnect_delay_ms")));
    }

    #[test]
    fn test_half_configured_notifier_warns() {
        let mut config = MonitorConfig::default();
        config.notify_sid = Some("onebot:1".to_string());
        let (_, warnings) = validate_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "notify_target"));
    }
}
