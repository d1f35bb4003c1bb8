use std::env;

use tiny_pipeline::app;
use tiny_pipeline::logging::init_logging;

#[show_image::main]
fn main() -> anyhow::Result<()> {
    let params = app::Params::from_args(env::args().skip(1))?;

    init_logging(params.log_filter.as_deref());

    app::run(params)?;

    return Ok(());
}
