use plotkit_designer::{
    Command, LayoutOptions, PenStrategy, PlotOptions, TextToGcode, ToolpathOptions,
};
use proptest::prelude::*;

fn pipeline(strategy: PenStrategy) -> TextToGcode {
    TextToGcode::new(&PlotOptions {
        toolpath: ToolpathOptions {
            strategy,
            ..ToolpathOptions::default()
        },
        layout: LayoutOptions::default(),
        ..PlotOptions::default()
    })
    .unwrap()
}

fn count(commands: &[Command], wanted: Command) -> usize {
    commands.iter().filter(|c| **c == wanted).count()
}

#[test]
fn test_round_letter_is_one_stroke() {
    let program = pipeline(PenStrategy::default()).compile("O");
    assert_eq!(program.pen_down_count(), 1);
}

#[test]
fn test_conservative_mode_lifts_per_segment() {
    let connected = pipeline(PenStrategy::default()).compile("O");
    let conservative = pipeline(PenStrategy::LiftEverySegment).compile("O");
    let linear_moves = conservative
        .toolpath()
        .iter()
        .filter(|c| matches!(c, Command::LinearMove { .. }))
        .count();
    assert_eq!(conservative.pen_down_count(), linear_moves);
    assert!(conservative.pen_down_count() > connected.pen_down_count());
}

proptest! {
    #[test]
    fn prop_pen_ups_balance_pen_downs(
        text in "[ -~\n]{0,40}",
        conservative in any::<bool>(),
    ) {
        let strategy = if conservative {
            PenStrategy::LiftEverySegment
        } else {
            PenStrategy::default()
        };
        let program = pipeline(strategy).compile(&text);
        let body = program.toolpath();

        prop_assert_eq!(count(body, Command::PenDown), count(body, Command::PenUp));
        if let Some(last) = body.last() {
            prop_assert_eq!(*last, Command::PenUp);
        }

        let commands = program.commands();
        prop_assert_eq!(&commands[..3], &[Command::SetUnits, Command::SetAbsolute, Command::PenUp]);
        prop_assert_eq!(&commands[commands.len() - 2..], &[Command::PenUp, Command::ProgramEnd]);
    }
}
