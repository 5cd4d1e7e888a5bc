mod opt;

use crate::opt::Opt;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use jetflow::{
    config::Config, prelude::*, reader::EventReadError, GIT_BRANCH, GIT_REV,
    VERSION,
};
use log::{debug, info};

type EventResult = std::result::Result<Event, EventReadError>;

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args);

    let env = Env::default().filter_or("JETFLOW_LOG", &opt.loglevel);
    env_logger::init_from_env(env);

    if let (Some(rev), Some(branch)) = (GIT_REV, GIT_BRANCH) {
        info!("jetflow {VERSION} rev {rev} ({branch})");
    } else {
        info!("jetflow {VERSION}");
    }

    debug!("settings: {:#?}", opt);

    let mut config = match &opt.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load settings from {path:?}"))?,
        None => Config::default(),
    };
    opt.merge_into(&mut config);
    opt.validate(&config)?;
    debug!("configuration: {:#?}", config);

    let classifier = config.classifier();
    let hard_scatter = CombinedReader::from_files(&opt.infiles, &classifier)?;
    let pileup: Box<dyn Iterator<Item = EventResult>> = if config.pileup_mu > 0. {
        let reader = CombinedReader::from_files(&opt.pileup, &classifier)?;
        Box::new(Cycle::new(reader))
    } else {
        Box::new(std::iter::empty())
    };

    let renderer = SvgDocument::builder()
        .dir(opt.outdir.clone())
        .style(config.style)
        .process(config.process.clone())
        .hadron_pt_min(config.hadron_pt_min)
        .pileup_mu(config.pileup_mu)
        .build();

    let mut display = EventDisplayBuilder {
        hard_scatter,
        pileup,
        renderer,
        config,
    }
    .build()?;
    let summary = display.run()?;
    debug!("{summary:#?}");
    info!("done");
    Ok(())
}
