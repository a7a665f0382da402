use std::{
    io::{self, Write},
    sync::Arc,
};

use table_core::{Props, Renderer};

#[derive(Default)]
pub struct TerminalRenderer {
    frames: u64,
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, props: &Arc<Props>) {
        self.frames += 1;
        let frame = format_frame(self.frames, props);
        let mut out = io::stdout().lock();
        if let Err(err) = out.write_all(frame.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!("failed to draw frame: {err}");
        }
    }
}

fn format_frame(number: u64, props: &Props) -> String {
    let mut frame = format!("-- frame {number} (hand {}) --\n", props.generation);

    let board = if props.board.is_empty() {
        "-".to_string()
    } else {
        props.board.join(" ")
    };
    frame.push_str(&format!("pot {}  board {board}", props.pot));
    if let Some((done, total)) = props.replay_progress {
        frame.push_str(&format!("  replay {done}/{total}"));
    }
    if props.animating {
        frame.push_str("  ~");
    }
    frame.push('\n');

    for seat in &props.seats {
        let marker = if seat.highlighted { '>' } else { ' ' };
        frame.push_str(&format!("{marker} seat {:<2} {:>10}", seat.seat.0, seat.stack));
        if let Some(bet) = &seat.bet {
            frame.push_str(&format!("  bet {bet}"));
        }
        if !seat.status.is_empty() {
            frame.push_str(&format!("  [{}]", seat.status));
        }
        if seat.cards_visible {
            frame.push_str("  (shown)");
        }
        frame.push('\n');
    }

    if !props.actions.is_empty() {
        let labels: Vec<_> = props.actions.iter().map(|action| action.label()).collect();
        frame.push_str(&format!("  actions: {}\n", labels.join(" / ")));
    }
    for banner in &props.banners {
        frame.push_str(&format!("  ** {banner} **\n"));
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    use shared::domain::{ActionKind, SeatIndex};
    use table_core::SeatProps;

    #[test]
    fn frame_marks_actor_and_banners() {
        let props = Props {
            generation: 2,
            seats: vec![
                SeatProps {
                    seat: SeatIndex(0),
                    stack: "900".into(),
                    bet: Some("100".into()),
                    status: "",
                    highlighted: false,
                    cards_visible: false,
                },
                SeatProps {
                    seat: SeatIndex(1),
                    stack: "1,000".into(),
                    bet: None,
                    status: "",
                    highlighted: true,
                    cards_visible: false,
                },
            ],
            board: Vec::new(),
            pot: "100".into(),
            actions: vec![ActionKind::Fold, ActionKind::Call, ActionKind::Raise],
            banners: vec!["Seat 0 wins 100".into()],
            animating: true,
            replay_progress: Some((1, 4)),
        };

        let frame = format_frame(3, &props);

        assert!(frame.starts_with("-- frame 3 (hand 2) --\n"));
        assert!(frame.contains("pot 100  board -  replay 1/4  ~"));
        assert!(frame.contains("> seat 1 "));
        assert!(frame.contains("bet 100"));
        assert!(frame.contains("actions: Fold / Call / Raise"));
        assert!(frame.contains("** Seat 0 wins 100 **"));
    }
}
