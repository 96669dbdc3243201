use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde_json::json;

/// One finished scope, in microseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResult<'a> {
    pub name: &'a str,
    pub start_us: u64,
    pub duration_us: u64,
    pub thread_id: u32,
}

struct Session {
    name: String,
    out: Box<dyn Write + Send>,
    events: u64,
}

impl Session {
    fn open(name: &str, mut out: Box<dyn Write + Send>) -> io::Result<Self> {
        out.write_all(br#"{"otherData":{},"traceEvents":["#)?;
        Ok(Self {
            name: name.to_owned(),
            out,
            events: 0,
        })
    }

    fn write(&mut self, result: &ProfileResult<'_>) -> io::Result<()> {
        if self.events > 0 {
            self.out.write_all(b",")?;
        }
        let event = json!({
            "cat": "function",
            "dur": result.duration_us,
            "name": result.name,
            "ph": "X",
            "pid": 0,
            "tid": result.thread_id,
            "ts": result.start_us,
        });
        serde_json::to_writer(&mut self.out, &event)?;
        self.events += 1;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let footer = self.out.write_all(b"]}").and_then(|()| self.out.flush());
        if let Err(err) = footer {
            log::warn!("profile session `{}` did not close cleanly: {err}", self.name);
        }
    }
}

/// Sink for profile events. At most one session is open at a time.
///
/// `new` is `const`, so the owner can keep one in a `static` and hand it to
/// [`init_profiling`](super::init_profiling).
pub struct Instrumentor {
    session: Mutex<Option<Session>>,
}

impl Default for Instrumentor {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrumentor {
    pub const fn new() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts writing to `path`, truncating it. An open session is closed
    /// first; if the file cannot be created no session is left open.
    pub fn begin_session(&self, name: &str, path: impl AsRef<Path>) -> io::Result<()> {
        self.end_session();
        let file = File::create(path.as_ref())?;
        self.begin_session_to(name, BufWriter::new(file))
    }

    /// Like [`begin_session`](Self::begin_session) but into any writer.
    pub fn begin_session_to(&self, name: &str, out: impl Write + Send + 'static) -> io::Result<()> {
        let mut slot = self.lock();
        if let Some(previous) = slot.take() {
            log::warn!("profile session `{}` was still open; closing it", previous.name);
        }
        *slot = Some(Session::open(name, Box::new(out))?);
        log::debug!("profile session `{name}` started");
        Ok(())
    }

    /// Closes the session and finishes the JSON document. No-op when idle.
    pub fn end_session(&self) {
        // Dropping the session writes the footer.
        if let Some(session) = self.lock().take() {
            log::debug!("profile session `{}` ended after {} events", session.name, session.events);
        }
    }

    /// Begins a session that ends when the guard drops.
    pub fn scoped_session(&self, name: &str, path: impl AsRef<Path>) -> io::Result<SessionGuard<'_>> {
        self.begin_session(name, path)?;
        Ok(SessionGuard { instrumentor: self })
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn session_name(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.name.clone())
    }

    /// Appends one event. Dropped silently when no session is open.
    pub fn write_profile(&self, result: &ProfileResult<'_>) {
        let mut slot = self.lock();
        let Some(session) = slot.as_mut() else { return };
        if let Err(err) = session.write(result) {
            log::warn!("profile event `{}` lost: {err}", result.name);
        }
    }
}

#[must_use = "the session ends when the guard is dropped"]
pub struct SessionGuard<'a> {
    instrumentor: &'a Instrumentor,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.instrumentor.end_session();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    use serde_json::Value;

    pub(crate) fn trace_path(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tessera-trace-{}-{test}.json", std::process::id()))
    }

    pub(crate) fn read_events(path: &Path) -> Vec<Value> {
        let text = std::fs::read_to_string(path).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        doc["traceEvents"].as_array().unwrap().clone()
    }

    pub(crate) fn names(events: &[Value]) -> Vec<&str> {
        events.iter().map(|e| e["name"].as_str().unwrap()).collect()
    }

    fn result(name: &str, start_us: u64) -> ProfileResult<'_> {
        ProfileResult {
            name,
            start_us,
            duration_us: 2,
            thread_id: 1,
        }
    }

    #[test]
    fn events_outside_a_session_are_dropped() {
        let sink = Instrumentor::new();
        let path = trace_path("idle");

        sink.write_profile(&result("early", 0));
        sink.begin_session("Late", &path).unwrap();
        assert_eq!(sink.session_name().as_deref(), Some("Late"));
        sink.write_profile(&result("manual \"quoted\"", 5));
        sink.write_profile(&result("second", 9));
        sink.end_session();
        sink.end_session();
        assert!(!sink.is_active());

        let events = read_events(&path);
        assert_eq!(names(&events), ["manual \"quoted\"", "second"]);
        assert_eq!(events[0]["ts"], 5);
        assert_eq!(events[0]["dur"], 2);
        assert_eq!(events[0]["ph"], "X");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn new_session_closes_the_previous_one() {
        let sink = Instrumentor::new();
        let first = trace_path("first");
        let second = trace_path("second");

        sink.begin_session("First", &first).unwrap();
        sink.write_profile(&result("a", 0));
        sink.begin_session("Second", &second).unwrap();
        assert_eq!(sink.session_name().as_deref(), Some("Second"));
        drop(sink.scoped_session("Third", &second).unwrap());
        assert!(!sink.is_active());

        assert_eq!(names(&read_events(&first)), ["a"]);
        assert!(read_events(&second).is_empty());
        let _ = std::fs::remove_file(first);
        let _ = std::fs::remove_file(second);
    }

    #[test]
    fn unwritable_path_leaves_no_session() {
        let sink = Instrumentor::new();
        sink.begin_session("Open", trace_path("unwritable")).unwrap();

        let path = std::env::temp_dir().join("tessera-no-such-dir").join("nested").join("t.json");
        assert!(sink.begin_session("Broken", &path).is_err());
        assert!(!sink.is_active());
        let _ = std::fs::remove_file(trace_path("unwritable"));
    }
}
