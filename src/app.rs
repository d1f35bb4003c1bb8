use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time;

use anyhow::{bail, Context};
use log::{info, warn};
use nalgebra as na;
use na::{point, vector, Matrix4, Point3};
use obj::raw::parse_obj;
use obj::{Obj, Position, Vertex};
use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions};

use crate::scene::camera::{fit_unit_cube, perspective, translation};
use crate::scene::shader::{Uniforms, VertexInput};
use crate::scene::{DrawCall, DrawStats, Scene};

/// Everything the binary can be told on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub model_path: Option<PathBuf>, // Built-in triangle when absent.
    pub output: PathBuf,
    pub show_window: bool,
    pub threads: usize,
    pub batch_size: usize, // Invocations per pool job, for both stages.
    pub fov: f32,          // Vertical, in degrees.
    pub log_filter: Option<String>,
}

impl Default for Params {
    fn default() -> Self {
        return Self {
            width: 800,
            height: 600,
            model_path: None,
            output: PathBuf::from("output.png"),
            show_window: false,
            threads: 4,
            batch_size: 1024,
            fov: 45.0,
            log_filter: None,
        };
    }
}

const USAGE: &str = "usage: tiny_pipeline [-m model.obj] [-o out.png] [-W width] [-H height] \
                     [-j threads] [-b batch] [--fov degrees] [--log filter] [-w]";

impl Params {
    /// Parses flags, program name already stripped.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> anyhow::Result<String> {
            return args.next().with_context(|| format!("missing value after {}\n{}", flag, USAGE));
        }
        fn number<T, I>(args: &mut I, flag: &str) -> anyhow::Result<T>
        where
            T: std::str::FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
            I: Iterator<Item = String>,
        {
            let raw = value(args, flag)?;
            return raw.parse().with_context(|| format!("invalid value {:?} for {}", raw, flag));
        }

        let mut params = Params::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-m" => params.model_path = Some(PathBuf::from(value(&mut args, &flag)?)),
                "-o" => params.output = PathBuf::from(value(&mut args, &flag)?),
                "-W" => params.width = number(&mut args, &flag)?,
                "-H" => params.height = number(&mut args, &flag)?,
                "-j" => params.threads = number(&mut args, &flag)?,
                "-b" => params.batch_size = number(&mut args, &flag)?,
                "--fov" => params.fov = number(&mut args, &flag)?,
                "--log" => params.log_filter = Some(value(&mut args, &flag)?),
                "-w" => params.show_window = true,
                _ => bail!("unknown flag {:?}\n{}", flag, USAGE),
            }
        }
        if params.width == 0 || params.height == 0 {
            bail!("target size must be non-zero, got {}x{}", params.width, params.height);
        }
        return Ok(params);
    }
}

/// The classic red, green and blue triangle.
pub fn demo_triangle() -> Vec<VertexInput> {
    return vec![
        VertexInput::new(vector![0.0, 1.0, 0.0], vector![1.0, 0.0, 0.0]),
        VertexInput::new(vector![-1.0, -1.0, 0.0], vector![0.0, 1.0, 0.0]),
        VertexInput::new(vector![1.0, -1.0, 0.0], vector![0.0, 0.0, 1.0]),
    ];
}

/// Color given to obj files without normals.
pub const UNLIT_MODEL_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Loads an obj file as a triangle list.
/// Vertex colors come from normals mapped to [0, 1], or are white when the file has no normals.
/// Returns the vertices and a model matrix fitting them into the unit cube.
pub fn load_model(path: &Path) -> anyhow::Result<(Vec<VertexInput>, Matrix4<f32>)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw = parse_obj(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))?;

    let (attributes, indices): (Vec<([f32; 3], [f32; 3])>, Vec<u32>) = if raw.normals.is_empty() {
        let model: Obj<Position, u32> =
            Obj::new(raw).with_context(|| format!("reading faces of {}", path.display()))?;
        let attributes: Vec<([f32; 3], [f32; 3])> = model
            .vertices
            .iter()
            .map(|vertex| (vertex.position, UNLIT_MODEL_COLOR))
            .collect();
        (attributes, model.indices)
    } else {
        let model: Obj<Vertex, u32> =
            Obj::new(raw).with_context(|| format!("reading faces of {}", path.display()))?;
        let attributes: Vec<([f32; 3], [f32; 3])> = model
            .vertices
            .iter()
            .map(|vertex| {
                let color = na::Vector3::from(vertex.normal) * 0.5 + vector![0.5, 0.5, 0.5];
                (vertex.position, [color.x, color.y, color.z])
            })
            .collect();
        (attributes, model.indices)
    };
    info!("Number of vertices - {}", attributes.len());
    info!("Number of indices  - {}", indices.len());

    let mut vertices = Vec::with_capacity(indices.len());
    let mut min = point![f32::MAX, f32::MAX, f32::MAX];
    let mut max = point![f32::MIN, f32::MIN, f32::MIN];
    for &index in &indices {
        let (position, color) = attributes
            .get(index as usize)
            .with_context(|| format!("index {} out of range in {}", index, path.display()))?;
        let position: Point3<f32> = (*position).into();
        min = min.inf(&position);
        max = max.sup(&position);
        vertices.push(VertexInput::new(position.coords, na::Vector3::from(*color)));
    }
    if vertices.is_empty() {
        warn!("{} has no faces", path.display());
        return Ok((vertices, Matrix4::identity()));
    }
    return Ok((vertices, fit_unit_cube(min, max)));
}

/// Camera of the demo: eye pulled back to z = 5, perspective on the target's aspect.
pub fn demo_uniforms(params: &Params, model: Matrix4<f32>) -> Uniforms {
    let aspect = params.width as f32 / params.height as f32;
    return Uniforms::new(
        model,
        translation(vector![0.0, 0.0, -5.0]),
        perspective(params.fov, aspect, 0.1, 50.0),
    );
}

/// Renders one frame into a fresh scene.
pub fn render(params: &Params) -> anyhow::Result<(Scene, DrawStats)> {
    let (vertices, model) = match &params.model_path {
        Some(path) => load_model(path)?,
        None => (demo_triangle(), Matrix4::identity()),
    };
    let mut scene = Scene::new(params.width, params.height, params.threads, params.batch_size);
    scene.clear(vector![0.0, 0.0, 0.0, 1.0]);

    let time_begin = time::Instant::now();
    let stats = scene.draw(&DrawCall {
        uniforms: demo_uniforms(params, model),
        vertices: &vertices,
    })?;
    info!("frame took {:.2} ms", time_begin.elapsed().as_secs_f64() * 1000.0);
    return Ok((scene, stats));
}

/// Helper, defining exit event to be an Escape key press.
fn is_exit_event(window_event: event::WindowEvent) -> bool {
    if let event::WindowEvent::KeyboardInput(event) = window_event {
        if event.input.key_code == Some(event::VirtualKeyCode::Escape) && event.input.state.is_released() {
            return true;
        }
    }
    return false;
}

/// Renders, writes the png and optionally keeps a window open until Escape.
pub fn run(params: Params) -> anyhow::Result<()> {
    let (scene, _) = render(&params)?;
    let image = scene.frame.to_image();
    image
        .save(&params.output)
        .with_context(|| format!("writing {}", params.output.display()))?;
    info!("wrote {}", params.output.display());

    if params.show_window {
        let window_options = WindowOptions {
            size: Some([params.width, params.height]),
            ..Default::default()
        };
        let window = create_window("output", window_options)?;
        let image_data = ImageView::new(ImageInfo::rgb8(params.width, params.height), image.as_raw());
        window.set_image("image", image_data)?;
        let event_channel = window.event_channel()?;
        // The channel closes together with the window.
        while let Ok(window_event) = event_channel.recv() {
            if is_exit_event(window_event) {
                break;
            }
        }
    }

    return Ok(());
}
