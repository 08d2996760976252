//! Assertion helpers for sync scenarios.
//!
//! Pure functions over captured state: they take what a scenario observed
//! and return pass/fail with details, so one failing check can report
//! everything it saw.

use crate::harness::RemoteState;

/// What one machine looked like after a scenario step.
#[derive(Debug, Clone, Default)]
pub struct MachineState {
    /// Machine label.
    pub name: String,
    /// Bytes of the synced save file, if it exists.
    pub save: Option<Vec<u8>>,
    /// Cache file content, trimmed.
    pub cached: Option<String>,
    /// Number of backup files in the save directory.
    pub backups: usize,
}

/// Result of an assertion check.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Description of what was checked
    pub description: String,
    /// Details on failure
    pub failure_details: Option<String>,
}

impl AssertionResult {
    /// Create a passing result.
    pub fn pass(description: &str) -> Self {
        Self {
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(description: &str, details: &str) -> Self {
        Self {
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }

    /// Panic with the details if the check failed.
    pub fn assert_passed(self) {
        if !self.passed {
            panic!(
                "{}: {}",
                self.description,
                self.failure_details.unwrap_or_default()
            );
        }
    }
}

/// Assert that every machine holds the remote save byte for byte.
pub fn assert_converged(machines: &[MachineState], remote: &RemoteState) -> AssertionResult {
    let Some(expected) = &remote.save else {
        return AssertionResult::fail("Convergence", "remote has no save blob");
    };

    for machine in machines {
        match &machine.save {
            Some(save) if save == expected => {}
            Some(save) => {
                return AssertionResult::fail(
                    "Convergence",
                    &format!(
                        "{} has {} bytes, remote has {} bytes with different content",
                        machine.name,
                        save.len(),
                        expected.len()
                    ),
                )
            }
            None => {
                return AssertionResult::fail(
                    "Convergence",
                    &format!("{} has no save file", machine.name),
                )
            }
        }
    }

    AssertionResult::pass(&format!(
        "All {} machines hold the remote save",
        machines.len()
    ))
}

/// Assert that a machine's cache equals the remote hash record.
///
/// Holds after any cycle that finished without error.
pub fn assert_cache_matches_record(machine: &MachineState, remote: &RemoteState) -> AssertionResult {
    let record = remote.record.as_deref().map(str::trim);
    match (machine.cached.as_deref(), record) {
        (Some(cached), Some(record)) if cached.eq_ignore_ascii_case(record) => {
            AssertionResult::pass(&format!("{} cache matches the record", machine.name))
        }
        (cached, record) => AssertionResult::fail(
            "Cache matches record",
            &format!(
                "{} cache is {:?}, record is {:?}",
                machine.name, cached, record
            ),
        ),
    }
}

/// Assert that the record and the payload were written together.
///
/// `payload_fingerprint` is the hash of the remote save blob as computed by
/// the scenario.
pub fn assert_record_describes_payload(
    remote: &RemoteState,
    payload_fingerprint: Option<&str>,
) -> AssertionResult {
    let record = remote.record.as_deref().map(str::trim);
    match (record, payload_fingerprint) {
        (Some(record), Some(actual)) if record.eq_ignore_ascii_case(actual) => {
            AssertionResult::pass("Record describes the payload")
        }
        (None, None) => AssertionResult::pass("Remote is empty"),
        (record, actual) => AssertionResult::fail(
            "Record describes payload",
            &format!("record is {:?}, payload hashes to {:?}", record, actual),
        ),
    }
}

/// Assert that a machine made exactly `expected` backups.
pub fn assert_backup_count(machine: &MachineState, expected: usize) -> AssertionResult {
    if machine.backups == expected {
        AssertionResult::pass(&format!("{} has {} backups", machine.name, expected))
    } else {
        AssertionResult::fail(
            "Backup count",
            &format!(
                "{} has {} backups, expected {}",
                machine.name, machine.backups, expected
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(name: &str, save: Option<&[u8]>, cached: Option<&str>) -> MachineState {
        MachineState {
            name: name.into(),
            save: save.map(<[u8]>::to_vec),
            cached: cached.map(str::to_string),
            backups: 0,
        }
    }

    fn remote(save: Option<&[u8]>, record: Option<&str>) -> RemoteState {
        RemoteState {
            save: save.map(<[u8]>::to_vec),
            record: record.map(str::to_string),
        }
    }

    #[test]
    fn test_converged_pass() {
        let r = remote(Some(b"data"), Some("aa"));
        let ms = [machine("A", Some(b"data"), None), machine("B", Some(b"data"), None)];
        assert!(assert_converged(&ms, &r).passed);
    }

    #[test]
    fn test_converged_fail_on_different_bytes() {
        let r = remote(Some(b"data"), Some("aa"));
        let ms = [machine("A", Some(b"data"), None), machine("B", Some(b"other"), None)];
        let result = assert_converged(&ms, &r);
        assert!(!result.passed);
        assert!(result.failure_details.unwrap().contains("B"));
    }

    #[test]
    fn test_converged_fail_on_missing_save() {
        let r = remote(Some(b"data"), Some("aa"));
        assert!(!assert_converged(&[machine("A", None, None)], &r).passed);
        assert!(!assert_converged(&[], &remote(None, None)).passed);
    }

    #[test]
    fn test_cache_matches_record_ignores_case_and_whitespace() {
        let r = remote(None, Some("ABCD\n"));
        assert!(assert_cache_matches_record(&machine("A", None, Some("abcd")), &r).passed);
        assert!(!assert_cache_matches_record(&machine("A", None, Some("abce")), &r).passed);
        assert!(!assert_cache_matches_record(&machine("A", None, None), &r).passed);
    }

    #[test]
    fn test_record_describes_payload() {
        assert!(assert_record_describes_payload(&remote(None, None), None).passed);
        assert!(assert_record_describes_payload(&remote(Some(b"x"), Some("ab")), Some("ab")).passed);
        assert!(!assert_record_describes_payload(&remote(Some(b"x"), Some("ab")), Some("cd")).passed);
        assert!(!assert_record_describes_payload(&remote(Some(b"x"), None), Some("cd")).passed);
    }

    #[test]
    fn test_backup_count() {
        let mut m = machine("A", None, None);
        assert!(assert_backup_count(&m, 0).passed);
        m.backups = 2;
        assert!(!assert_backup_count(&m, 1).passed);
    }

    #[test]
    #[should_panic(expected = "Backup count")]
    fn test_unwrap_panics_on_failure() {
        assert_backup_count(&machine("A", None, None), 1).assert_passed();
    }
}
