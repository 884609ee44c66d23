//! Process-level collaborators: logging, plugin discovery, signal handling.

use crate::dispatch::Services;
use crate::error::LaunchError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directories searched for plugins, separated like `PATH`.
pub const PLUGIN_PATH_ENV: &str = "MPM_PLUGIN_PATH";

const PLUGIN_EXTENSIONS: &[&str] = &["so", "dylib", "dll"];

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the fmt subscriber on stderr. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = log_subscriber(filter, std::io::stderr).try_init();
}

/// Fmt subscriber behind [`init_tracing`], writing to `writer`.
fn log_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer)
        .finish()
}

/// Logger handle attached to a simulation object; the run loop enters its span.
#[derive(Clone, Debug)]
pub struct LogHandle {
    span: tracing::Span,
}

impl LogHandle {
    pub fn new(kind: &str) -> Self {
        Self {
            span: tracing::info_span!("simulation", kind = %kind),
        }
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static SIGNAL_INSTALL: Once = Once::new();

/// Route Ctrl-C into [`interrupt_requested`] and clear any earlier request,
/// so each launch starts uninterrupted. Fire-and-forget: a failure to install
/// is logged and otherwise ignored.
pub fn install_signal_handler() {
    INTERRUPTED.store(false, Ordering::SeqCst);
    SIGNAL_INSTALL.call_once(|| {
        match ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst)) {
            Ok(()) => debug!("signal handler installed"),
            Err(e) => warn!("could not install signal handler: {e}"),
        }
    });
}

/// True once the process has been signaled. Run loops poll this between frames.
pub fn interrupt_requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

// ---------------------------------------------------------------------------
// Plugins
// ---------------------------------------------------------------------------

/// Discovers plugin libraries in a list of search directories.
#[derive(Clone, Debug, Default)]
pub struct PluginManager {
    search_path: Vec<PathBuf>,
    loaded: Vec<PathBuf>,
}

impl PluginManager {
    /// Search path taken from `MPM_PLUGIN_PATH`; empty when unset.
    pub fn from_env() -> Self {
        let search_path = std::env::var_os(PLUGIN_PATH_ENV)
            .map(|value| std::env::split_paths(&value).collect())
            .unwrap_or_default();
        Self::with_search_path(search_path)
    }

    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self {
            search_path,
            loaded: Vec::new(),
        }
    }

    /// Register every plugin library found. Directories that do not exist are
    /// skipped; an existing directory that cannot be listed is an error.
    pub fn load_all_plugins(&mut self) -> Result<usize, LaunchError> {
        let mut found = Vec::new();
        for dir in &self.search_path {
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "plugin directory missing, skipped");
                continue;
            }
            let entries = std::fs::read_dir(dir)
                .map_err(|e| LaunchError::Plugin(format!("{}: {e}", dir.display())))?;
            for entry in entries {
                let path = entry
                    .map_err(|e| LaunchError::Plugin(format!("{}: {e}", dir.display())))?
                    .path();
                if is_plugin_library(&path) {
                    found.push(path);
                }
            }
        }
        found.sort();
        for path in &found {
            info!(plugin = %path.display(), "plugin registered");
        }
        self.loaded = found;
        Ok(self.loaded.len())
    }

    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }
}

fn is_plugin_library(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PLUGIN_EXTENSIONS.contains(&ext))
}

// ---------------------------------------------------------------------------
// Production services
// ---------------------------------------------------------------------------

/// The real process collaborators used by the executables.
#[derive(Debug, Default)]
pub struct ProcessServices {
    plugins: PluginManager,
}

impl ProcessServices {
    pub fn from_env() -> Self {
        Self {
            plugins: PluginManager::from_env(),
        }
    }
}

impl Services for ProcessServices {
    fn load_plugins(&mut self) -> Result<usize, LaunchError> {
        self.plugins.load_all_plugins()
    }

    fn install_signal_handler(&mut self) {
        install_signal_handler();
    }

    fn init_logging(&mut self, kind: &str) -> LogHandle {
        LogHandle::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[test]
    fn discovers_only_plugin_libraries() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("libdamage.so"), b"").unwrap();
        fs::write(dir.path().join("libfluid.dylib"), b"").unwrap();
        fs::write(dir.path().join("README.md"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.so")).unwrap();

        let mut manager = PluginManager::with_search_path(vec![dir.path().to_path_buf()]);
        assert_eq!(manager.load_all_plugins().unwrap(), 2);
        let names: Vec<_> = manager
            .loaded()
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_owned))
            .collect();
        assert_eq!(names, vec!["libdamage.so", "libfluid.dylib"]);
    }

    #[test]
    fn missing_directories_are_skipped() {
        let dir = tempdir().unwrap();
        let mut manager = PluginManager::with_search_path(vec![dir.path().join("absent")]);
        assert_eq!(manager.load_all_plugins().unwrap(), 0);
    }

    #[test]
    fn signal_install_is_idempotent_and_clears_earlier_interrupts() {
        install_signal_handler();
        install_signal_handler();
        assert!(!interrupt_requested());

        INTERRUPTED.store(true, Ordering::SeqCst);
        assert!(interrupt_requested());
        install_signal_handler();
        assert!(!interrupt_requested(), "next launch must start uninterrupted");
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_lines_go_to_the_configured_writer() {
        let capture = Capture::default();
        let writer = {
            let capture = capture.clone();
            move || capture.clone()
        };
        let subscriber = log_subscriber(EnvFilter::new("info"), writer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("failed to read scene.lua");
            tracing::debug!("filtered out");
        });

        let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("failed to read scene.lua"), "{logged}");
        assert!(!logged.contains("filtered out"));
    }
}
