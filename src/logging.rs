use log::Log;

/// Journal logger that lets this crate through at Info (Debug when enabled)
/// and everything else only at Warn.
struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

fn is_own_target(target: &str) -> bool {
    target.starts_with("mail2tracks") || target.starts_with("tracks_check")
}

impl Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if is_own_target(metadata.target()) {
            let max = if crate::debug_logging() {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            metadata.level() <= max
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Log to the systemd journal (`journalctl -t <identifier> -f`).
///
/// Without a journal the process keeps running unlogged; the reason is
/// reported on stderr.
pub fn init(identifier: &str) {
    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier(identifier.to_string()),
        Err(e) => {
            eprintln!("{}: journal unavailable, logging disabled: {}", identifier, e);
            return;
        }
    };

    if let Err(e) = log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })) {
        eprintln!("{}: failed to install logger: {}", identifier, e);
        return;
    }
    // Global max must be Debug so our debug logs can pass through when toggled
    log::set_max_level(log::LevelFilter::Debug);
}
