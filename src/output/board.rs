//! Live view of the balance board: center of pressure trail and the four force cells.

use crate::device::{ConnectionState, FramedListener, ListenerStats, Transport};
use crate::devices::balanceboard::{self, Telemetry};
use crate::error::{DeviceError, TelemetryError};
use crate::render;
use crate::session::Session;
use crate::trail::Trail;
use serialport::SerialPort;
use std::fmt;
use std::path::PathBuf;

/// Board outline in cm, centered on the origin.
pub const BOARD_WIDTH_CM: f64 = 60.0;
pub const BOARD_HEIGHT_CM: f64 = 45.0;

/// Below this total force the board counts as unloaded and no shares are shown.
pub const FORCE_THRESHOLD: f64 = 1.0;

pub const MIN_OPACITY: f64 = 0.3;
pub const MAX_OPACITY: f64 = 1.0;

/// Where and how big each redraw is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub path: PathBuf,
    pub size: (u32, u32),
}

/// Counters of what happened to the lines fed into a [`BoardState`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub records: u64,
    pub diagnostics: u64,
    pub malformed: u64,
}

/// Latest reading plus the COP trail.
#[derive(Debug, Default, Clone)]
pub struct BoardState {
    current: Telemetry,
    trail: Trail,
    stats: BoardStats,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Telemetry {
        &self.current
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn stats(&self) -> BoardStats {
        self.stats
    }

    /// Replace the current reading and extend the trail.
    pub fn record(&mut self, reading: Telemetry) {
        self.current = reading;
        self.trail.push(reading.cop());
        self.stats.records += 1;
    }

    /// Fold the outcome of parsing one line into the state.
    ///
    /// Lines that do not parse leave the reading untouched and are only counted.
    pub fn apply(&mut self, parsed: Result<Telemetry, TelemetryError>) {
        match parsed {
            Ok(reading) => self.record(reading),
            Err(e) if e.is_diagnostic() => {
                self.stats.diagnostics += 1;
                log::trace!("{e}");
            }
            Err(e) => {
                self.stats.malformed += 1;
                log::debug!("Dropped line: {e}");
            }
        }
    }

    pub fn view(&self) -> BoardView {
        let Telemetry { f1, f2, f3, f4, .. } = self.current;
        let total = self.current.total_force();
        BoardView {
            cop: self.current.cop(),
            trail: self.trail.iter().collect(),
            cells: [
                ForceCell::new("F2", f2, total),
                ForceCell::new("F1", f1, total),
                ForceCell::new("F3", f3, total),
                ForceCell::new("F4", f4, total),
            ],
            total,
        }
    }
}

/// One cell of the 2x2 force grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceCell {
    pub name: &'static str,
    pub force: f64,
    /// Share of the total force in percent, `None` while the board is unloaded.
    pub percent: Option<f64>,
    pub opacity: f64,
}

impl ForceCell {
    pub fn new(name: &'static str, force: f64, total: f64) -> Self {
        if total > FORCE_THRESHOLD {
            let share = force.abs() / total.abs().max(1.0);
            ForceCell {
                name,
                force,
                percent: Some(force.abs() / total.abs() * 100.0),
                opacity: (MIN_OPACITY + share * (MAX_OPACITY - MIN_OPACITY))
                    .clamp(MIN_OPACITY, MAX_OPACITY),
            }
        } else {
            ForceCell {
                name,
                force,
                percent: None,
                opacity: MIN_OPACITY,
            }
        }
    }

    pub fn force_label(&self) -> String {
        format!("{:.1} Kg", self.force)
    }

    pub fn percent_label(&self) -> String {
        match self.percent {
            Some(pct) => format!("{pct:.1}%"),
            None => "0%".to_string(),
        }
    }
}

/// Everything a redraw needs, derived from the current state only.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    pub cop: (f64, f64),
    /// COP trail, oldest first.
    pub trail: Vec<(f64, f64)>,
    /// Cells in grid order: F2 top left, F1 top right, F3 bottom left, F4 bottom right.
    pub cells: [ForceCell; 4],
    pub total: f64,
}

impl BoardView {
    pub fn cop_label(&self) -> String {
        format!("COP: ({:.1}, {:.1}) cm", self.cop.0, self.cop.1)
    }

    pub fn total_label(&self) -> String {
        format!("Total: {:.1} Kg", self.total)
    }
}

impl fmt::Display for BoardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cop_label())?;
        for cell in &self.cells {
            write!(
                f,
                ", {} {} ({})",
                cell.name,
                cell.force_label(),
                cell.percent_label()
            )?;
        }
        write!(f, ", {}", self.total_label())
    }
}

/// Parses telemetry from the device and renders the board on every tick.
pub struct Visualizer<P> {
    listener: FramedListener<P, Telemetry>,
    board: BoardState,
    target: Option<RenderTarget>,
    render_failures: u64,
}

impl Visualizer<Box<dyn SerialPort>> {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, DeviceError> {
        let port = balanceboard::open_port(path, baud_rate)?;
        Ok(Visualizer::new(port))
    }
}

impl<P: Transport> Visualizer<P> {
    pub fn new(port: P) -> Self {
        Visualizer {
            listener: FramedListener::new(port),
            board: BoardState::new(),
            target: None,
            render_failures: 0,
        }
    }

    /// Render every tick to the given image.
    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn state(&self) -> ConnectionState {
        self.listener.state()
    }

    /// Redraws that could not be written, e.g. because a viewer holds the file.
    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    pub fn stats(&self) -> (ListenerStats, BoardStats) {
        (self.listener.stats(), self.board.stats())
    }

    /// Drain the device and fold all complete lines into the board state.
    ///
    /// Returns the number of readings applied.
    pub fn update(&mut self) -> usize {
        let frames = match self.listener.poll() {
            Ok(frames) => frames,
            Err(e) => {
                log::debug!("{e}");
                return 0;
            }
        };

        let before = self.board.stats().records;
        for parsed in frames {
            self.board.apply(parsed);
        }
        (self.board.stats().records - before) as usize
    }

    /// Release the port. The last board state stays readable.
    pub fn close(&mut self) {
        if self.listener.close().is_some() {
            let (listener, board) = self.stats();
            log::info!(
                "Visualizer closed after {listener:?}, {board:?}, {} failed redraws",
                self.render_failures
            );
        }
    }
}

impl<P: Transport> Session for Visualizer<P> {
    fn tick(&mut self) -> anyhow::Result<()> {
        self.update();
        if let Some(target) = &self.target {
            if let Err(e) = render::render_png(&self.board.view(), &target.path, target.size) {
                self.render_failures += 1;
                log::warn!("Failed to redraw {}: {e:#}", target.path.display());
            }
        }
        Ok(())
    }
}
