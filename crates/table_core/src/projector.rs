//! Display-oriented projection of the model, memoized on structural equality
//! so the drawing layer only ever sees a new [`Props`] when something visible
//! changed.

use std::sync::{Arc, Mutex, PoisonError};

use shared::domain::{ActionKind, SeatIndex, SeatStatus};

use crate::{
    model::Model,
    store::{Store, Subscription},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatProps {
    pub seat: SeatIndex,
    pub stack: String,
    pub bet: Option<String>,
    pub status: &'static str,
    pub highlighted: bool,
    pub cards_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Props {
    pub generation: u64,
    pub seats: Vec<SeatProps>,
    pub board: Vec<String>,
    pub pot: String,
    pub actions: Vec<ActionKind>,
    pub banners: Vec<String>,
    pub animating: bool,
    pub replay_progress: Option<(usize, usize)>,
}

pub fn project(model: &Model) -> Props {
    let seats = model
        .seats
        .iter()
        .map(|(index, seat)| SeatProps {
            seat: *index,
            stack: seat.stack.to_string(),
            bet: (!seat.bet.is_zero()).then(|| seat.bet.to_string()),
            status: match seat.status {
                SeatStatus::Active => "",
                SeatStatus::Folded => "Folded",
                SeatStatus::AllIn => "All-in",
            },
            highlighted: model.to_act_seat == Some(*index),
            cards_visible: seat.cards_visible,
        })
        .collect();

    Props {
        generation: model.generation,
        seats,
        board: model.board.iter().map(ToString::to_string).collect(),
        pot: model.pot.to_string(),
        actions: model.legal_actions.iter().copied().collect(),
        banners: model
            .banners
            .iter()
            .map(|banner| banner.text.clone())
            .collect(),
        animating: model.is_animating(),
        replay_progress: (!model.replay.steps.is_empty())
            .then(|| (model.replay.cursor, model.replay.steps.len())),
    }
}

#[derive(Default)]
pub struct Projector {
    cached: Option<(Arc<Model>, Arc<Props>)>,
    projections: u64,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached `Arc<Props>` itself when `model` is value-equal to
    /// the last one projected.
    pub fn project(&mut self, model: &Arc<Model>) -> Arc<Props> {
        if let Some((last_model, last_props)) = &self.cached {
            if Arc::ptr_eq(last_model, model) || **last_model == **model {
                return Arc::clone(last_props);
            }
        }

        self.projections += 1;
        let fresh = project(model);
        let props = match self.cached.take() {
            // Bookkeeping-only model changes (timers, id counters) keep the
            // previous props instance.
            Some((_, last_props)) if *last_props == fresh => last_props,
            _ => Arc::new(fresh),
        };
        self.cached = Some((Arc::clone(model), Arc::clone(&props)));
        props
    }

    /// Number of times props were actually recomputed.
    pub fn projections(&self) -> u64 {
        self.projections
    }
}

/// Drawing layer. Receives a new props instance only when it differs from the
/// previous one.
pub trait Renderer: Send {
    fn render(&mut self, props: &Arc<Props>);
}

struct Attached<R> {
    projector: Projector,
    last: Option<Arc<Props>>,
    renderer: R,
}

impl<R: Renderer> Attached<R> {
    fn show(&mut self, model: &Arc<Model>) {
        let props = self.projector.project(model);
        if self
            .last
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, &props))
        {
            return;
        }
        self.renderer.render(&props);
        self.last = Some(props);
    }
}

/// Renders the current model immediately, then on every accepted change.
pub fn attach_renderer<R>(store: &Store, renderer: R) -> Subscription
where
    R: Renderer + 'static,
{
    let attached = Arc::new(Mutex::new(Attached {
        projector: Projector::new(),
        last: None,
        renderer,
    }));

    let notified = Arc::clone(&attached);
    let subscription = store.subscribe(move |model| {
        notified
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .show(model);
    });

    attached
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .show(&store.current_model());

    subscription
}

#[cfg(test)]
#[path = "tests/projector_tests.rs"]
mod tests;
