#![forbid(unsafe_code)]

//! Terminal driver for a [`Host`] backed by a [`ThreadScheduler`].
//!
//! The program owns the host loop. Everything that touches widgets happens
//! on the thread that calls [`Program::run`]: key handling, timer dispatch,
//! and redraws.
//!
//! # Loop
//!
//! 1. [`Screen::init`] mounts the initial widgets. A mount failure aborts the
//!    run with [`ProgramError::Mount`].
//! 2. Each iteration waits for input (interactive) or for the next timer
//!    firing (headless), dispatches due firings, and redraws if any widget
//!    requested it.
//! 3. The loop ends on a quit key, after `exit_after`, or once
//!    `exit_after_ticks` firings have been delivered.
//! 4. All widgets are unmounted and the terminal is restored.
//!
//! # Output
//!
//! Each redraw prints the text content of every mounted widget, one line per
//! widget. Interactive mode redraws in place (raw mode, cursor hidden);
//! headless mode appends every frame, which keeps output pipe-friendly.

use std::fmt;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveToColumn, MoveToPreviousLine, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use ticker_core::{MountError, Node};
use tracing::{debug, debug_span, info, info_span};

use crate::host::Host;
use crate::thread_scheduler::{ThreadScheduler, ThreadSchedulerConfig};

/// How the program talks to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw mode, in-place redraws, keyboard input.
    Interactive,
    /// Plain appended lines, no input.
    Headless,
}

/// Configuration for the program loop.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Terminal mode.
    pub mode: OutputMode,
    /// Upper bound on how long one loop iteration waits for input or timers.
    pub poll_timeout: Duration,
    /// Stop after this much wall-clock time.
    pub exit_after: Option<Duration>,
    /// Stop once this many timer firings have been delivered.
    pub exit_after_ticks: Option<u64>,
    /// Scheduler configuration.
    pub scheduler: ThreadSchedulerConfig,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Interactive,
            poll_timeout: Duration::from_millis(25),
            exit_after: None,
            exit_after_ticks: None,
            scheduler: ThreadSchedulerConfig::default(),
        }
    }
}

impl ProgramConfig {
    /// Append-only output without raw mode or input.
    #[must_use]
    pub fn headless(mut self) -> Self {
        self.mode = OutputMode::Headless;
        self
    }

    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Stop after `after` of wall-clock time.
    #[must_use]
    pub fn with_exit_after(mut self, after: Duration) -> Self {
        self.exit_after = Some(after);
        self
    }

    /// Stop after `ticks` delivered firings.
    #[must_use]
    pub fn with_exit_after_ticks(mut self, ticks: u64) -> Self {
        self.exit_after_ticks = Some(ticks);
        self
    }
}

/// Whether the loop should keep going after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// `q`, `Esc`, or `Ctrl+C`.
#[must_use]
pub fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Application logic on top of the host: what to mount and how keys map to
/// lifecycle changes.
pub trait Screen {
    /// Mount the initial widgets.
    fn init(&mut self, host: &mut Host<ThreadScheduler>) -> Result<(), MountError>;

    /// React to a key press. The default only handles quit keys.
    fn handle_key(
        &mut self,
        key: KeyEvent,
        _host: &mut Host<ThreadScheduler>,
    ) -> Result<Control, MountError> {
        if is_quit_key(&key) {
            Ok(Control::Quit)
        } else {
            Ok(Control::Continue)
        }
    }
}

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Timer firings delivered to callbacks.
    pub ticks: u64,
    /// Frames written.
    pub frames: u64,
}

/// Errors that end a run.
#[derive(Debug)]
pub enum ProgramError {
    /// Terminal I/O failed.
    Io(io::Error),
    /// A widget could not be mounted.
    Mount(MountError),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "terminal I/O error: {err}"),
            Self::Mount(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Mount(err) => Some(err),
        }
    }
}

impl From<io::Error> for ProgramError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<MountError> for ProgramError {
    fn from(err: MountError) -> Self {
        Self::Mount(err)
    }
}

/// Raw mode and hidden cursor for the lifetime of the guard.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// The host loop.
pub struct Program<Sc: Screen, W: Write = Stdout> {
    screen: Sc,
    host: Host<ThreadScheduler>,
    writer: W,
    config: ProgramConfig,
    running: bool,
    ticks: u64,
    frames: u64,
    /// Lines written by the last in-place redraw.
    drawn_lines: usize,
}

impl<Sc: Screen> Program<Sc, Stdout> {
    /// Create a program writing to stdout.
    pub fn new(screen: Sc, config: ProgramConfig) -> Self {
        Self::with_writer(screen, config, io::stdout())
    }
}

impl<Sc: Screen, W: Write> Program<Sc, W> {
    /// Create a program writing frames to `writer`.
    pub fn with_writer(screen: Sc, config: ProgramConfig, writer: W) -> Self {
        let scheduler = ThreadScheduler::with_config(config.scheduler.clone());
        Self {
            screen,
            host: Host::new(scheduler),
            writer,
            config,
            running: true,
            ticks: 0,
            frames: 0,
            drawn_lines: 0,
        }
    }

    /// The widget host.
    pub fn host(&self) -> &Host<ThreadScheduler> {
        &self.host
    }

    /// The application screen.
    pub fn screen(&self) -> &Sc {
        &self.screen
    }

    /// Run until quit or an exit condition is met.
    pub fn run(&mut self) -> Result<RunSummary, ProgramError> {
        let _run_span = info_span!("program_run", mode = ?self.config.mode).entered();

        let guard = match self.config.mode {
            OutputMode::Interactive => Some(TerminalGuard::enter()?),
            OutputMode::Headless => None,
        };

        let result = self.run_loop();
        let unmounted = self.host.unmount_all();

        if guard.is_some() {
            let _ = queue!(self.writer, Print("\r\n"));
            let _ = self.writer.flush();
        }
        drop(guard);

        let summary = RunSummary {
            ticks: self.ticks,
            frames: self.frames,
        };
        info!(
            ticks = summary.ticks,
            frames = summary.frames,
            unmounted,
            ok = result.is_ok(),
            "program finished"
        );
        result.map(|()| summary)
    }

    fn run_loop(&mut self) -> Result<(), ProgramError> {
        self.screen.init(&mut self.host)?;
        self.redraw_if_dirty()?;

        let start = Instant::now();
        while self.running {
            if let Some(limit) = self.config.exit_after
                && start.elapsed() >= limit
            {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                debug!(elapsed_ms, "exit_after reached");
                break;
            }
            let budget = self.tick_budget();
            if budget == 0 {
                debug!(ticks = self.ticks, "exit_after_ticks reached");
                break;
            }

            let delivered = match self.config.mode {
                OutputMode::Interactive => {
                    self.poll_input()?;
                    self.host.scheduler().dispatch_pending(budget)
                }
                OutputMode::Headless => self
                    .host
                    .scheduler()
                    .wait_and_dispatch(self.config.poll_timeout, budget),
            };
            self.ticks += delivered as u64;

            self.redraw_if_dirty()?;
        }
        Ok(())
    }

    /// Firings still allowed before `exit_after_ticks` stops the loop.
    fn tick_budget(&self) -> usize {
        match self.config.exit_after_ticks {
            Some(limit) => usize::try_from(limit.saturating_sub(self.ticks)).unwrap_or(usize::MAX),
            None => usize::MAX,
        }
    }

    fn poll_input(&mut self) -> Result<(), ProgramError> {
        if !event::poll(self.config.poll_timeout)? {
            return Ok(());
        }
        loop {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.screen.handle_key(key, &mut self.host)? == Control::Quit {
                        debug!("quit requested");
                        self.running = false;
                        return Ok(());
                    }
                }
                Event::Resize(..) => self.host.invalidator().request(),
                _ => {}
            }
            if !event::poll(Duration::ZERO)? {
                return Ok(());
            }
        }
    }

    fn redraw_if_dirty(&mut self) -> io::Result<()> {
        if !self.host.take_redraw() {
            return Ok(());
        }
        let lines: Vec<String> = self
            .host
            .render_all()
            .iter()
            .map(Node::text_content)
            .collect();
        let _span = debug_span!("redraw", frame = self.frames, lines = lines.len()).entered();

        match self.config.mode {
            OutputMode::Interactive => self.draw_in_place(&lines)?,
            OutputMode::Headless => {
                for line in &lines {
                    writeln!(self.writer, "{line}")?;
                }
                self.writer.flush()?;
            }
        }
        self.frames += 1;
        Ok(())
    }

    fn draw_in_place(&mut self, lines: &[String]) -> io::Result<()> {
        if self.drawn_lines > 1 {
            let up = u16::try_from(self.drawn_lines - 1).unwrap_or(u16::MAX);
            queue!(self.writer, MoveToPreviousLine(up))?;
        } else {
            queue!(self.writer, MoveToColumn(0))?;
        }
        queue!(self.writer, Clear(ClearType::FromCursorDown))?;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                queue!(self.writer, Print("\r\n"))?;
            }
            queue!(self.writer, Print(line))?;
        }
        self.writer.flush()?;
        self.drawn_lines = lines.len().max(1);
        Ok(())
    }
}
