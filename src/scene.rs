//! Host side of the pipeline: draw calls, parallel dispatch of the two stages and the
//! fixed-function steps between them.

pub mod buffer;
pub mod camera;
pub mod raster;
pub mod shader;
pub mod util;

use std::sync::{mpsc, Arc};

use anyhow::ensure;
use log::{debug, info, trace};
use nalgebra as na;
use na::Vector4;
use threadpool::ThreadPool;

use buffer::FrameBuffer;
use raster::{EdgeFunctionRasterizer, Fragment, Interpolator, LinearInterpolator, Rasterizer};
use shader::{shading_stage, transform_stage, Uniforms, VertexInput, VertexOutput};

/// One batch of triangles sharing the same bound matrices.
/// Vertices are read as a triangle list, trailing vertices that don't make a triangle are
/// transformed but not drawn.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub uniforms: Uniforms,
    pub vertices: &'a [VertexInput],
}

/// Counters of a finished draw call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub vertices: usize,
    pub triangles: usize,
    pub fragments: usize, // Shaded, whether committed or not.
    pub committed: usize, // Passed the depth test.
}

/// Frame buffer plus everything needed to run draw calls into it.
pub struct Scene<R = EdgeFunctionRasterizer, I = LinearInterpolator> {
    pub frame: FrameBuffer,
    rasterizer: R,
    interpolator: I,
    pool: ThreadPool,
    batch_size: usize,
}

impl Scene {
    /// Scene with the built-in rasterizer and linear interpolation.
    pub fn new(width: u32, height: u32, threads: usize, batch_size: usize) -> Self {
        return Self::with_strategies(
            FrameBuffer::new(width, height),
            EdgeFunctionRasterizer::new(width, height),
            LinearInterpolator,
            threads,
            batch_size,
        );
    }
}

impl<R: Rasterizer, I: Interpolator> Scene<R, I> {
    pub fn with_strategies(
        frame: FrameBuffer,
        rasterizer: R,
        interpolator: I,
        threads: usize,
        batch_size: usize,
    ) -> Self {
        return Self {
            frame,
            rasterizer,
            interpolator,
            pool: ThreadPool::new(threads.max(1)),
            batch_size: batch_size.max(1),
        };
    }

    pub fn clear(&mut self, background: Vector4<f32>) {
        self.frame.clear(background);
    }

    /// Runs a draw call: transform stage over every vertex, rasterization of every triangle,
    /// shading stage over every fragment, then depth-tested commits in primitive order.
    ///
    /// Stage invocations run on the worker pool in batches with no ordering between them.
    /// Results are put back in submission order, so the frame does not depend on scheduling.
    pub fn draw(&mut self, draw: &DrawCall<'_>) -> anyhow::Result<DrawStats> {
        let uniforms = draw.uniforms;
        let transformed: Vec<VertexOutput> = dispatch(
            &self.pool,
            draw.vertices,
            self.batch_size,
            move |vertex| transform_stage(vertex, &uniforms),
        )?;

        let triangles = transformed.chunks_exact(3);
        if !triangles.remainder().is_empty() {
            debug!("ignoring {} trailing vertices", triangles.remainder().len());
        }
        let mut stats = DrawStats {
            vertices: transformed.len(),
            triangles: triangles.len(),
            ..Default::default()
        };

        let mut fragments: Vec<Fragment> = Vec::new();
        for triangle in triangles {
            let triangle = [triangle[0], triangle[1], triangle[2]];
            self.rasterizer
                .rasterize(&triangle, &self.interpolator, |fragment| fragments.push(fragment));
        }
        stats.fragments = fragments.len();

        let colors = dispatch(&self.pool, &fragments, self.batch_size, |fragment| {
            shading_stage(fragment.color)
        })?;
        for (fragment, color) in fragments.iter().zip(colors) {
            if self.frame.write_fragment(fragment.coord, fragment.depth, color) {
                stats.committed += 1;
            }
        }

        info!(
            "draw: {} vertices, {} triangles, {} fragments, {} committed",
            stats.vertices, stats.triangles, stats.fragments, stats.committed
        );
        return Ok(stats);
    }
}

/// Applies `f` to every item on the pool, batch by batch, returning outputs in item order.
fn dispatch<T, O, F>(pool: &ThreadPool, items: &[T], batch_size: usize, f: F) -> anyhow::Result<Vec<O>>
where
    T: Copy + Send + 'static,
    O: Send + 'static,
    F: Fn(&T) -> O + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let (sender, receiver) = mpsc::channel();
    let mut n_batches = 0;
    for (batch_index, chunk) in items.chunks(batch_size).enumerate() {
        let batch = chunk.to_vec();
        let f = Arc::clone(&f);
        let sender = sender.clone();
        pool.execute(move || {
            let outputs: Vec<O> = batch.iter().map(|item| f(item)).collect();
            trace!("batch {} done, {} items", batch_index, outputs.len());
            // Receiver is only gone if the dispatching thread already bailed out.
            let _ = sender.send((batch_index, outputs));
        });
        n_batches += 1;
    }
    drop(sender);
    debug!("dispatched {} items in {} batches", items.len(), n_batches);

    let mut batches: Vec<Option<Vec<O>>> = (0..n_batches).map(|_| None).collect();
    for (batch_index, outputs) in receiver.iter() {
        batches[batch_index] = Some(outputs);
    }
    let finished = batches.iter().filter(|batch| batch.is_some()).count();
    ensure!(
        finished == n_batches,
        "worker pool lost {} of {} batches",
        n_batches - finished,
        n_batches
    );
    return Ok(batches.into_iter().flatten().flatten().collect());
}
