/*!
    Process-wide log callback.

    The engine reports noteworthy events (open failures, seek problems,
    stream selection) through a single process-wide callback. Messages at
    or below the severity chosen when the callback was installed are
    delivered; everything else is dropped. Logging is advisory only —
    nothing in the engine changes behavior based on it.

    There is exactly one subscriber slot: installing a callback replaces
    the previous one (last setter wins). This mirrors the process-wide
    nature of the underlying libraries' logging and is explicitly not
    multi-tenant safe.
*/

use std::sync::RwLock;

/**
    Ordered log severity.

    Lower values are more severe. [`LogLevel::Quiet`] suppresses all
    output when used as a filter.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Quiet,
    Panic,
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
}

impl LogLevel {
    /**
        The numeric value of this level, matching the libav convention
        (-8 for quiet, 0 for panic, up to 48 for debug).
    */
    pub const fn value(self) -> i32 {
        match self {
            Self::Quiet => -8,
            Self::Panic => 0,
            Self::Fatal => 8,
            Self::Error => 16,
            Self::Warning => 24,
            Self::Info => 32,
            Self::Verbose => 40,
            Self::Debug => 48,
        }
    }
}

type Callback = Box<dyn Fn(LogLevel, &str) + Send + Sync>;

struct Subscriber {
    level: LogLevel,
    callback: Callback,
}

static SUBSCRIBER: RwLock<Option<Subscriber>> = RwLock::new(None);

/**
    Install the process-wide log callback.

    Messages with severity `level` or more severe are delivered. Replaces
    any previously installed callback.
*/
pub fn set_log_callback<F>(level: LogLevel, callback: F)
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    let mut slot = SUBSCRIBER.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(Subscriber {
        level,
        callback: Box::new(callback),
    });
}

/**
    Remove the process-wide log callback, if any.
*/
pub fn clear_log_callback() {
    let mut slot = SUBSCRIBER.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

/**
    Deliver a message to the installed callback, if its filter admits it.
*/
pub fn emit(level: LogLevel, message: &str) {
    let slot = SUBSCRIBER.read().unwrap_or_else(|e| e.into_inner());
    if let Some(subscriber) = slot.as_ref() {
        if level <= subscriber.level && subscriber.level != LogLevel::Quiet {
            (subscriber.callback)(level, message);
        }
    }
}
