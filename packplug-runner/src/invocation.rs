//! One plugin subprocess invocation: spawn, frame I/O, and termination
//! (spec §4.D, §5). Grounded on `scarb::process::exec_piping`'s use of
//! `thread::scope` to pipe a child's stdout/stderr concurrently with
//! waiting on it, adapted here to framed stdin/stdout instead of line text.

use crate::error::RunError;
use crate::sandbox::SandboxPolicy;
use camino::Utf8Path;
use crossbeam_channel::{bounded, select};
use packplug_wire::framing::{read_message, write_message};
use packplug_wire::{BuildCommand, Diagnostic, HostMessage, Input, PluginMessage, PrebuildCommand, UserCommand};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, debug_span};

/// How long to wait after closing stdin before escalating to signals
/// (spec §5 "Cancellation": "implementation-chosen grace period").
const CANCEL_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Commands and diagnostics accumulated from one plugin session, in
/// emission order (spec §4.D "Ordering").
#[derive(Debug, Default)]
pub struct Output {
    pub build_commands: Vec<BuildCommand>,
    pub prebuild_commands: Vec<PrebuildCommand>,
    pub user_commands: Vec<UserCommand>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lets the caller request cancellation of an in-flight invocation from
/// another thread (spec §5: invocations may run on parallel workers).
#[derive(Clone)]
pub struct Canceller {
    sender: crossbeam_channel::Sender<()>,
}

impl Canceller {
    pub fn cancel(&self) {
        let _ = self.sender.send(());
    }
}

fn cancel_pair() -> (Canceller, crossbeam_channel::Receiver<()>) {
    let (tx, rx) = bounded(0);
    (Canceller { sender: tx }, rx)
}

/// Runs one plugin invocation to completion: spawns `executable` with no
/// in-band arguments, sends `PerformAction{input}`, and collects plugin
/// output until `ActionComplete` or EOF (spec §4.D "Contract").
///
/// `text_sink` receives each line of stderr as it arrives, in arrival order
/// (spec §4.D "Pipes"). Returns a [`Canceller`] the caller may use from
/// another thread to abort the invocation early.
pub fn invoke(
    executable: &Utf8Path,
    writable_dirs: &[&Utf8Path],
    cache_dir: &Utf8Path,
    input: Input,
    text_sink: Arc<dyn Fn(String) + Send + Sync>,
) -> (Canceller, thread::JoinHandle<Result<Output, RunError>>) {
    let (canceller, cancel_rx) = cancel_pair();
    let executable = executable.to_owned();
    let cache_dir = cache_dir.to_owned();
    let mut all_writable: Vec<camino::Utf8PathBuf> =
        writable_dirs.iter().map(|p| (*p).to_owned()).collect();
    all_writable.push(cache_dir.clone());

    let handle = thread::spawn(move || {
        let writable: Vec<&Utf8Path> = all_writable.iter().map(|p| p.as_path()).collect();
        run(&executable, &writable, &cache_dir, input, text_sink, cancel_rx)
    });
    (canceller, handle)
}

fn run(
    executable: &Utf8Path,
    writable_dirs: &[&Utf8Path],
    cache_dir: &Utf8Path,
    input: Input,
    text_sink: Arc<dyn Fn(String) + Send + Sync>,
    cancel_rx: crossbeam_channel::Receiver<()>,
) -> Result<Output, RunError> {
    let policy = SandboxPolicy::new(writable_dirs);
    let mut cmd: Command = policy.wrap(executable);
    cmd.current_dir(cache_dir.as_std_path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let command_line = format!("{executable}");
    let mut child = cmd.spawn().map_err(|source| RunError::SubprocessDidNotStart {
        executable: command_line.clone(),
        source,
    })?;

    let pid = child.id();
    let cancelled = Arc::new(AtomicBool::new(false));

    // Shared so the watcher thread can close it the instant cancellation is
    // requested (spec §5/SPEC_FULL "close stdin → wait grace period →
    // escalate signals") while the main thread still owns it for the
    // initial write and any `SymbolGraphRequest` reply.
    let stdin = Arc::new(Mutex::new(Some(child.stdin.take().expect("piped stdin"))));
    let mut stdout = child.stdout.take().expect("piped stdout");
    let stderr = child.stderr.take().expect("piped stderr");

    let (done_tx, done_rx) = bounded(0);
    let watcher = {
        let cancelled = cancelled.clone();
        let stdin = stdin.clone();
        thread::spawn(move || {
            select! {
                recv(cancel_rx) -> _ => {
                    cancelled.store(true, Ordering::SeqCst);
                    debug!(pid, "cancellation requested: closing plugin stdin");
                    stdin.lock().unwrap().take();
                    thread::sleep(CANCEL_GRACE_PERIOD);
                    debug!(pid, "escalating to SIGTERM after cancellation grace period");
                    escalate::terminate(pid);
                    thread::sleep(CANCEL_GRACE_PERIOD);
                    debug!(pid, "escalating to SIGKILL");
                    escalate::kill(pid);
                }
                recv(done_rx) -> _ => {}
            }
        })
    };

    let stderr_buf = Arc::new(Mutex::new(String::new()));
    let stderr_thread = {
        let stderr_buf = stderr_buf.clone();
        thread::spawn(move || {
            let _span = debug_span!("plugin_stderr").entered();
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                stderr_buf.lock().unwrap().push_str(&line);
                stderr_buf.lock().unwrap().push('\n');
                text_sink(line);
            }
        })
    };

    {
        let mut guard = stdin.lock().unwrap();
        let s = guard.as_mut().expect("stdin not yet closed at invocation start");
        write_message(s, &HostMessage::PerformAction { input })?;
    }

    let mut output = Output::default();
    let mut success = None;
    loop {
        let msg: Option<PluginMessage> = read_message(&mut stdout)?;
        let Some(msg) = msg else { break };
        match msg {
            PluginMessage::EmitDiagnostic { diagnostic } => output.diagnostics.push(diagnostic),
            PluginMessage::DefineBuildCommand { command } => output.build_commands.push(command),
            PluginMessage::DefinePrebuildCommand { command } => {
                output.prebuild_commands.push(command)
            }
            PluginMessage::DefineUserCommand { command } => output.user_commands.push(command),
            PluginMessage::SymbolGraphRequest { .. } => {
                let mut guard = stdin.lock().unwrap();
                if let Some(s) = guard.as_mut() {
                    write_message(
                        s,
                        &HostMessage::ErrorResponse {
                            error: "symbol graph requests are not supported".into(),
                        },
                    )?;
                }
            }
            PluginMessage::ActionComplete { success: s } => {
                success = Some(s);
                break;
            }
        }
    }
    stdin.lock().unwrap().take(); // host closes stdin once it stops sending (spec §4.D).

    let status = child.wait().map_err(|source| RunError::SubprocessDidNotStart {
        executable: command_line.clone(),
        source,
    })?;
    let _ = done_tx.send(());
    let _ = watcher.join();
    let _ = stderr_thread.join();

    if cancelled.load(Ordering::SeqCst) {
        return Err(RunError::Cancelled { command_line });
    }
    if !status.success() {
        return Err(RunError::SubprocessFailed {
            command_line,
            status,
            stderr: stderr_buf.lock().unwrap().clone(),
        });
    }
    match success {
        Some(true) => Ok(output),
        Some(false) | None => Err(RunError::MissingPluginOutput {
            command_line,
            stderr: stderr_buf.lock().unwrap().clone(),
        }),
    }
}

/// Escalating termination signals, sent by pid so the watcher thread needs
/// no shared ownership of the `Child` (spec §5 "Cancellation").
mod escalate {
    #[cfg(unix)]
    pub fn terminate(pid: u32) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }

    #[cfg(unix)]
    pub fn kill(pid: u32) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
    }

    #[cfg(not(unix))]
    pub fn terminate(_pid: u32) {
        tracing::debug!("no graceful-termination signal on this platform");
    }

    #[cfg(not(unix))]
    pub fn kill(_pid: u32) {
        tracing::debug!("no forced-kill escalation implemented on this platform");
    }
}
