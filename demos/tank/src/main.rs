//! Drives a small tank over a grass background with the direction keys.
//! Enter asks on stdin which binding to move to a new key.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use quad_ngin::{
    Engine, EngineConfig, Event, LoggingConfig, Polled, Triangle, Vertex,
    cgmath::{Deg, Matrix4, SquareMatrix, Vector3},
    init_logging,
};

const STEP: f32 = 0.01;

struct Tank {
    x: f32,
    y: f32,
    angle: f32,
}

impl Tank {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Up => {
                self.y += STEP;
                self.angle = 180.0;
            }
            Event::Down => {
                self.y -= STEP;
                self.angle = 0.0;
            }
            Event::Right => {
                self.x += STEP;
                self.angle = 90.0;
            }
            Event::Left => {
                self.x -= STEP;
                self.angle = -90.0;
            }
            _ => {}
        }
    }

    /// Turns the sprite around its own centre, then moves it.
    fn transform(&self) -> Matrix4<f32> {
        let centre = Vector3::new(-0.95, -0.95, 0.0);
        Matrix4::from_translation(Vector3::new(self.x, self.y, 0.0))
            * Matrix4::from_translation(centre)
            * Matrix4::from_angle_z(Deg(self.angle))
            * Matrix4::from_translation(-centre)
    }
}

fn quad(x0: f32, y0: f32, x1: f32, y1: f32, repeat: f32) -> (Triangle, Triangle) {
    let v0 = Vertex::new(x1, y1, 0.0, 1.0, 0.0, 0.0, repeat, 1.0);
    let v1 = Vertex::new(x1, y0, 0.0, 0.0, 1.0, 0.0, repeat, 0.0);
    let v2 = Vertex::new(x0, y0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    let v3 = Vertex::new(x0, y1, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0);
    (Triangle::new(v0, v1, v2), Triangle::new(v3, v2, v1))
}

fn ask_binding() -> anyhow::Result<String> {
    print!("Choose key to rebind: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets");
    let mut engine = Engine::initialize(EngineConfig::default().with_asset_dir(assets))?;

    let fone = engine.load_texture("fone.png")?;
    let tank_texture = engine.load_texture("tank.png")?;
    let (t1, t2) = quad(-1.0, -1.0, 1.0, 1.0, 2.0);
    let (t3, t4) = quad(-1.0, -1.0, -0.9, -0.9, 1.0);

    let mut tank = Tank {
        x: 0.0,
        y: 0.0,
        angle: 0.0,
    };

    'frames: loop {
        while let Some(polled) = engine.poll_event() {
            match polled {
                Polled::Pressed(Event::Exit) => break 'frames,
                Polled::Pressed(Event::Start) => {
                    let name = ask_binding()?;
                    match engine.rebind_key(&name) {
                        Ok(()) => println!("Press the new key for {name}"),
                        Err(e) => println!("{e}"),
                    }
                }
                Polled::Pressed(event) => tank.handle(event),
                Polled::Rebound { event, key } => println!("{event} is now on {key:?}"),
                Polled::Released(_) | Polled::Unbound => {}
            }
        }

        engine.draw_texture(&t1, &t2, fone, Matrix4::identity())?;
        engine.draw_texture(&t3, &t4, tank_texture, tank.transform())?;
        engine.swap_buffers()?;
    }

    engine.destroy()?;
    Ok(())
}
