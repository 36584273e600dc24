use clap::{Parser, Subcommand};
use terrascape_common::{TileCoord, Transform};
use terrascape_history::ActionHistory;
use terrascape_scene::{PlacedModel, Scene, Subject, TerrainTile};
use terrascape_tools::{HistoryInspector, SceneInspector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terrascape-cli", about = "CLI tool for terrascape operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Run a scripted editing session with undo/redo
    Session {
        /// Number of terrain tiles to create
        #[arg(short, long, default_value = "4")]
        tiles: usize,
        /// Number of steps to undo (and then redo)
        #[arg(short, long, default_value = "2")]
        undo: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("terrascape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("tools: {}", terrascape_tools::crate_info());
        }
        Commands::Session { tiles, undo } => {
            println!("Editing session: tiles={tiles}, undo={undo}");

            let mut scene = Scene::new();
            let mut history = ActionHistory::new();

            // Each tile creation is its own undoable action.
            for i in 0..tiles {
                let tile = TerrainTile::new(TileCoord::new(i as i32, 0), 8, 0.0);
                let handle = scene.insert(Box::new(tile));
                history.on_create(&scene, handle)?;
                history.end_action(&scene)?;
            }

            // Place a model, then nudge it in a second action.
            let model = PlacedModel::new("rocks/boulder_large", Transform::default());
            let handle = scene.insert(Box::new(model));
            history.on_create(&scene, handle)?;
            history.end_action(&scene)?;

            history.begin_modify(&scene, handle)?;
            {
                let mut bytes = Vec::new();
                let subject = scene.get(handle).expect("model is live");
                subject.save_state(&mut bytes)?;
                let mut model: PlacedModel = terrascape_scene::decode_state(&bytes)?;
                model.set_transform(Transform {
                    position: glam::Vec3::new(3.0, 0.0, -1.5),
                    ..Transform::default()
                });
                bytes.clear();
                terrascape_scene::encode_state(&model, &mut bytes)?;
                scene
                    .get_mut(handle)
                    .expect("model is live")
                    .load_state(&bytes)?;
            }
            history.end_action(&scene)?;

            println!("{}", HistoryInspector::summary(&history));
            for line in HistoryInspector::describe_events(&history) {
                println!("  {line}");
            }

            for _ in 0..undo {
                history.undo(&mut scene)?;
            }
            println!("After undo x{undo}: {}", HistoryInspector::summary(&history));

            for _ in 0..undo {
                history.redo(&mut scene)?;
            }
            println!("After redo x{undo}: {}", HistoryInspector::summary(&history));

            println!("{}", SceneInspector::summary(&scene));
            println!("Live subjects:");
            for info in SceneInspector::list_subjects(&scene) {
                println!("  {info}");
            }
        }
    }

    Ok(())
}
