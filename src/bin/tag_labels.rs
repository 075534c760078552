use anyhow::Context;
use clap::Parser;
use mapping_tools::utils::logger;
use mapping_tools::utils::validation::Validate;
use mapping_tools::{LabelResolver, Metric, TagConfig, TomlConfig};
use std::io::{BufRead, BufReader, Write};

fn main() -> anyhow::Result<()> {
    let args = TagConfig::parse();
    logger::init(args.log.verbose, args.log.log_json);

    let mut config = TomlConfig::load_or_default(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(database) = &args.database {
        config.database.name = database.clone();
    }
    config.validate().context("invalid configuration")?;

    tracing::info!("🏷️ Resolving labels from {}", config.database.name);
    let mut resolver = LabelResolver::open(config).context("failed to open database")?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("failed to open {}", path))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());

    // 每行視為一個批次，跟原本的處理器一樣在批次開頭檢查是否需要重新載入
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let metric: Metric = serde_json::from_str(&line)
            .with_context(|| format!("line {} is not a metric", index + 1))?;
        let mut batch = [metric];
        resolver.apply(&mut batch)?;

        serde_json::to_writer(&mut out, &batch[0])?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}
