use clap::{Parser, ValueEnum};
use macroquad::prelude::*;
use tilers::{Agent, Game, MultiStepAgent, RandomAgent};
use tilers::game::{SIZE, tile_value};

const SCORE_AREA_HEIGHT: f32 = 60.0;
const SCORE_TEXT_SIZE: f32 = 40.0;
const CELL_SIZE: i32 = 120;
const GRID_PADDING: f32 = 8.0;
const AGENT_TICK_SPEED: f32 = 0.03; // seconds

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Random,
    Best,
}

/// Watch an agent play.
#[derive(Parser)]
#[command(name = "main", about = "Watch a 2048 agent play")]
struct Cli {
    /// Player kind: random moves, or multi-step lookahead
    #[arg(long, value_enum, default_value_t = Mode::Random)]
    mode: Mode,

    /// Lookahead depth for `--mode best`
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    steps: u64,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "2048".to_owned(),
        window_width: SIZE as i32 * CELL_SIZE,
        window_height: (SCORE_AREA_HEIGHT as i32) + SIZE as i32 * CELL_SIZE,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut agent: Box<dyn Agent> = match cli.mode {
        Mode::Random => Box::new(RandomAgent::new()),
        Mode::Best => match MultiStepAgent::new(cli.steps as usize) {
            Ok(agent) => Box::new(agent),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
    };

    let mut game = Game::new();
    let mut time_accumulator: f32 = 0.0; // seconds
    let mut reported = false;

    loop {
        if !game.game_over() {
            time_accumulator += get_frame_time();
            while time_accumulator >= AGENT_TICK_SPEED && !game.game_over() {
                time_accumulator -= AGENT_TICK_SPEED;

                let action = agent.select_action(&game.state());
                game.do_action(action);
            }
        } else if !reported {
            log::info!("{} finished with score {}", agent.name(), game.score());
            reported = true;
        }

        draw(&game);

        next_frame().await
    }
}

fn rgb(hex: u32) -> Color {
    Color::from_rgba((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255)
}

// (background, text) for a tile of the given magnitude
fn tile_colors(value: u32) -> (Color, Color) {
    let background = match value {
        0 => 0x9e948a,
        2 => 0xeee4da,
        4 => 0xede0c8,
        8 => 0xf2b179,
        16 => 0xf59563,
        32 => 0xf67c5f,
        64 => 0xf65e3b,
        128 => 0xedcf72,
        256 => 0xedcc61,
        512 => 0xedc850,
        1024 => 0xedc53f,
        _ => 0xedc22e,
    };
    let text = if value <= 4 { 0x776e65 } else { 0xf9f6f2 };
    (rgb(background), rgb(text))
}

fn draw_centered_text(text: &str, center_x: f32, center_y: f32, size: f32, color: Color) {
    let dims = measure_text(text, None, size as u16, 1.0);
    draw_text(
        text,
        center_x - dims.width / 2.0,
        center_y - dims.height / 2.0 + dims.offset_y,
        size,
        color,
    );
}

fn draw(game: &Game) {
    let screen_w = screen_width();
    let screen_h = screen_height();

    clear_background(rgb(0x92877d));


    // score area

    draw_rectangle(0.0, 0.0, screen_w, SCORE_AREA_HEIGHT, Color::new(0.1, 0.1, 0.2, 1.0));
    draw_line(0.0, SCORE_AREA_HEIGHT, screen_w, SCORE_AREA_HEIGHT, 2.0, BLACK);

    let score_text = if game.game_over() {
        format!("You Lose! Score: {}", game.score())
    } else {
        format!("Score: {}", game.score())
    };
    draw_centered_text(&score_text, screen_w / 2.0, SCORE_AREA_HEIGHT / 2.0, SCORE_TEXT_SIZE, WHITE);


    // board

    let cell_width = screen_w / SIZE as f32;
    let cell_height = (screen_h - SCORE_AREA_HEIGHT) / SIZE as f32;

    for (row, values) in game.state().iter().enumerate() {
        for (col, &exponent) in values.iter().enumerate() {
            let x = col as f32 * cell_width;
            let y = SCORE_AREA_HEIGHT + row as f32 * cell_height;
            let value = tile_value(exponent);
            let (background, text_color) = tile_colors(value);

            draw_rectangle(
                x + GRID_PADDING,
                y + GRID_PADDING,
                cell_width - GRID_PADDING * 2.0,
                cell_height - GRID_PADDING * 2.0,
                background,
            );

            if value > 0 {
                let size = if value < 1000 { 48.0 } else { 36.0 };
                draw_centered_text(
                    &value.to_string(),
                    x + cell_width / 2.0,
                    y + cell_height / 2.0,
                    size,
                    text_color,
                );
            }
        }
    }
}
