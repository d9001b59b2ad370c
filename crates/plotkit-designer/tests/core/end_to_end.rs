use plotkit_designer::{
    text_to_gcode, Command, LayoutOptions, PlacementMode, PlotOptions, TextToGcode,
};

fn top_left_pipeline() -> TextToGcode {
    TextToGcode::new(&PlotOptions {
        layout: LayoutOptions {
            cap_height_mm: 10.0,
            max_line_width_mm: Some(1000.0),
            placement: PlacementMode::TopLeft,
            ..LayoutOptions::default()
        },
        ..PlotOptions::default()
    })
    .unwrap()
}

#[test]
fn test_hi_single_line_block() {
    let pipeline = top_left_pipeline();
    let block = pipeline.engine().prepare("HI");
    assert_eq!(block.lines.len(), 1);
    assert!((block.height_mm() - 10.0).abs() < 1e-6);

    let placed = pipeline.engine().place(&block);
    let bounds = placed.bounds.unwrap();
    assert!((bounds.height() - 10.0).abs() < 1e-6);
    assert!((bounds.min_x - 5.0).abs() < 1e-9);
    assert!((bounds.max_y - 145.0).abs() < 1e-9);
}

#[test]
fn test_hi_program_shape() {
    let program = top_left_pipeline().compile("HI");
    let body = program.toolpath();

    assert!(matches!(body[0], Command::RapidMove { .. }));
    assert_eq!(body[1], Command::PenDown);

    // 'H' starts at its top-left stem, anchored to the top-left margin
    match body[0] {
        Command::RapidMove { x, y } => {
            assert!((x - 5.0).abs() < 1e-9);
            assert!((y - 145.0).abs() < 1e-9);
        }
        other => panic!("unexpected first command {other:?}"),
    }

    let commands = program.commands();
    assert_eq!(&commands[commands.len() - 2..], &[Command::PenUp, Command::ProgramEnd]);
    // H is three strokes, I is one
    assert_eq!(program.pen_down_count(), 4);
}

#[test]
fn test_hi_gcode_text() {
    let gcode = top_left_pipeline().generate("HI");
    let lines: Vec<&str> = gcode.lines().collect();
    assert_eq!(&lines[..5], &["G21", "G90", "M5", "G4 P0.000", "F2500"]);
    assert_eq!(lines[5], "G0 X5.000 Y145.000");
    assert_eq!(lines[6], "M03 S35");
    assert_eq!(lines[8], "G1 X5.000 Y135.000");
    assert_eq!(lines.last(), Some(&"M30"));
}

#[test]
fn test_whitespace_only_input_draws_nothing() {
    let gcode = text_to_gcode(" \n \t").unwrap();
    assert!(!gcode.contains("G0 "));
    assert!(!gcode.contains("G1 "));
    assert!(!gcode.contains("M03"));
}

#[test]
fn test_multiline_text_stacks_downward() {
    let program = top_left_pipeline().compile("H\nH");
    let rapids: Vec<(f64, f64)> = program
        .toolpath()
        .iter()
        .filter_map(|c| match c {
            Command::RapidMove { x, y } => Some((*x, *y)),
            _ => None,
        })
        .collect();
    // first stroke of each 'H' is its left stem top
    assert!((rapids[0].1 - 145.0).abs() < 1e-9);
    assert!((rapids[3].1 - (145.0 - 10.0 - 3.5)).abs() < 1e-6);
}
