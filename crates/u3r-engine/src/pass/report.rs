/// Maximum length, in bytes, of one stage's diagnostic log.
pub const INFO_LOG_CAPACITY: usize = 512;

/// Outcome of compiling and linking a [`Pass`](super::Pass).
///
/// Each field holds the diagnostic of one step, `None` when that step
/// succeeded (or was not reached). Logs are truncated to
/// [`INFO_LOG_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub link: Option<String>,
}

impl CompileReport {
    /// `true` when both stages compiled and linked.
    pub fn is_ok(&self) -> bool {
        self.vertex.is_none() && self.fragment.is_none() && self.link.is_none()
    }

    pub(crate) fn emit(&self) {
        for (step, log) in [
            ("vertex shader", &self.vertex),
            ("fragment shader", &self.fragment),
            ("program link", &self.link),
        ] {
            if let Some(log) = log {
                log::error!("{step}: {log}");
            }
        }
    }
}

/// Cuts `log` to at most [`INFO_LOG_CAPACITY`] bytes on a char boundary.
pub(crate) fn truncate_log(mut log: String) -> String {
    if log.len() > INFO_LOG_CAPACITY {
        let mut end = INFO_LOG_CAPACITY;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_logs_are_untouched() {
        assert_eq!(truncate_log("oops".to_string()), "oops");
    }

    #[test]
    fn long_logs_are_capped() {
        let log = "x".repeat(INFO_LOG_CAPACITY * 2);
        assert_eq!(truncate_log(log).len(), INFO_LOG_CAPACITY);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; an odd prefix forces the cut between its bytes.
        let log = format!("a{}", "é".repeat(INFO_LOG_CAPACITY));
        let out = truncate_log(log);
        assert!(out.len() <= INFO_LOG_CAPACITY);
        assert!(out.len() >= INFO_LOG_CAPACITY - 1);
    }

    #[test]
    fn empty_report_is_ok() {
        assert!(CompileReport::default().is_ok());
        let failed = CompileReport {
            link: Some("boom".into()),
            ..Default::default()
        };
        assert!(!failed.is_ok());
    }
}
