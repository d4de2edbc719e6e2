//! Plot panel events
//!
//! The chart panel reacts to a handful of things: the user picks another
//! plot, the panel is resized, history arrives from the backend, or the
//! user asks for the chart. Each is a [`PlotEvent`]; [`PlotController`]
//! owns the panel's [`PlotContext`] and answers every event with a
//! [`PlotOutcome`].
//!
//! Network callbacks do not touch the controller directly. They push
//! events through an [`EventSender`] and the owner of the controller
//! drains the [`EventQueue`] on its own thread.

use crossbeam_channel::{unbounded, Receiver, Sender};
use url::Url;

use crate::api::{ApiResponse, HistoryPayload};
use crate::chart::build_chart_url;
use crate::config::{ChartConfig, RenderArea};
use crate::error::Result;
use crate::plot::PlotSelection;
use crate::types::HistoryRecord;

/// Something that happened to the plot panel
#[derive(Debug, Clone)]
pub enum PlotEvent {
    /// The user picked another plot selector
    SelectionChanged(String),

    /// The panel's drawable area changed
    Resized(RenderArea),

    /// A history request completed
    HistoryLoaded {
        instance_id: String,
        response: ApiResponse<HistoryPayload>,
    },

    /// The user asked for the chart
    GenerateRequested,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq)]
pub enum PlotOutcome {
    /// Context changed, nothing to draw yet
    Updated,
    /// A chart was requested before any history arrived
    Pending,
    /// Chart image URL ready for display
    Rendered(Url),
    /// The event could not be handled; message is for the user
    Failed(String),
}

/// State of one plot panel
#[derive(Debug, Clone)]
pub struct PlotContext {
    pub selection: PlotSelection,
    pub area: RenderArea,
    pub instance_id: Option<String>,
    pub history: Option<Vec<HistoryRecord>>,
}

/// Handles [`PlotEvent`]s for one panel
#[derive(Debug)]
pub struct PlotController {
    config: ChartConfig,
    context: PlotContext,
}

impl PlotController {
    /// Controller showing `selection` until the user picks another one
    pub fn new(config: ChartConfig, selection: PlotSelection, area: RenderArea) -> Self {
        Self {
            config,
            context: PlotContext {
                selection,
                area,
                instance_id: None,
                history: None,
            },
        }
    }

    /// Controller showing the first configured plot
    pub fn with_default_plot(config: ChartConfig, area: RenderArea) -> Result<Self> {
        let first = config
            .plots
            .first()
            .map(String::as_str)
            .unwrap_or(crate::config::DEFAULT_PLOTS[0]);
        let selection = first.parse()?;
        Ok(Self::new(config, selection, area))
    }

    /// Current panel state
    pub fn context(&self) -> &PlotContext {
        &self.context
    }

    /// Handle one event
    pub fn handle(&mut self, event: PlotEvent) -> PlotOutcome {
        match event {
            PlotEvent::SelectionChanged(selector) => match selector.parse::<PlotSelection>() {
                Ok(selection) => {
                    tracing::debug!("Plot selection changed to '{}'", selection);
                    self.context.selection = selection;
                    PlotOutcome::Updated
                }
                Err(e) => PlotOutcome::Failed(e.to_string()),
            },
            PlotEvent::Resized(area) => {
                self.context.area = area;
                PlotOutcome::Updated
            }
            PlotEvent::HistoryLoaded {
                instance_id,
                response,
            } => match response.into_result().and_then(HistoryPayload::into_records) {
                Ok(records) => {
                    tracing::debug!(
                        "Loaded {} history rows for instance {}",
                        records.len(),
                        instance_id
                    );
                    self.context.instance_id = Some(instance_id);
                    self.context.history = Some(records);
                    PlotOutcome::Updated
                }
                Err(e) => {
                    tracing::warn!("Failed to load history for {}: {}", instance_id, e);
                    PlotOutcome::Failed(format!("Failed to plot history: {}", e))
                }
            },
            PlotEvent::GenerateRequested => self.render(),
        }
    }

    fn render(&self) -> PlotOutcome {
        let Some(history) = &self.context.history else {
            return PlotOutcome::Pending;
        };
        let area = self.context.area.with_min_height(self.config.min_plot_height);
        match build_chart_url(
            history,
            &self.context.selection,
            self.context.instance_id.as_deref(),
            area,
            &self.config,
        ) {
            Ok(url) => PlotOutcome::Rendered(url),
            Err(e) => PlotOutcome::Failed(e.to_string()),
        }
    }
}

/// Cloneable handle for posting events from callbacks
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<PlotEvent>,
}

impl EventSender {
    /// Post an event. Returns false when the queue is gone.
    pub fn send(&self, event: PlotEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Queue of pending events, drained by the controller's owner
#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<PlotEvent>,
    rx: Receiver<PlotEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Handle for posting events
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are queued
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Handle every queued event in order
    pub fn drain(&self, controller: &mut PlotController) -> Vec<PlotOutcome> {
        self.rx
            .try_iter()
            .map(|event| controller.handle(event))
            .collect()
    }
}
