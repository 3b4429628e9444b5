use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tinyrnn::utils::io::remove_if_exists;
use tinyrnn::{load_model, transform_file, DecodePolicy, RunConfig, TinyRnnError};

/// Reformats a text file with a pretrained character-level RNN.
#[derive(Parser, Debug)]
#[command(name = "tinyrnn", version, about = "Deterministic char-RNN text transformer")]
struct Cli {
    /// GPU to run on. Inference is CPU-only; any value >= 0 falls back to CPU.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    gpuid: i32,

    /// JSON run configuration (decoding policy, batch threads).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample with this temperature instead of greedy decoding.
    #[arg(long)]
    temperature: Option<f32>,

    /// Seed for sampled decoding.
    #[arg(long, requires = "temperature")]
    seed: Option<u64>,

    /// Model checkpoint (.bin, or .json)
    model: PathBuf,

    /// Input text file
    input: PathBuf,

    /// Output file, written atomically
    output: PathBuf,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("reading run config {}", path.display()))?,
            None => RunConfig::default(),
        };
        if let Some(temperature) = self.temperature {
            config.decoding = DecodePolicy::Sampled { temperature, seed: self.seed.unwrap_or(0) };
        }
        config.validate()?;
        Ok(config)
    }

    fn run(self) -> Result<()> {
        // nothing from an earlier run may survive a failed one
        remove_if_exists(&self.output)
            .with_context(|| format!("clearing output {}", self.output.display()))?;

        if self.gpuid >= 0 {
            tracing::warn!(gpuid = self.gpuid, "GPU inference is not available, running on CPU");
        }
        let config = self.run_config()?;

        let model = load_model(&self.model)
            .map_err(TinyRnnError::from)
            .with_context(|| format!("loading model {}", self.model.display()))?;
        let model = Arc::new(model);

        transform_file(&model, &self.input, &self.output, &config)
            .with_context(|| format!("transforming {}", self.input.display()))?;
        Ok(())
    }
}

/// Accepts the single-dash `-gpuid N` spelling used by existing callers.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-gpuid") => OsString::from("--gpuid"),
            Some(s) if s.starts_with("-gpuid=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tinyrnn=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    cli.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use tinyrnn::tokenizer::VocabularySpec;
    use tinyrnn::{save_model, CellKind, CharRnn, ModelConfig};

    fn save_small_model(path: &std::path::Path) {
        let vocabulary = VocabularySpec { symbols: "{}:;ab".chars().collect(), unknown: '?' };
        let config = ModelConfig {
            cell: CellKind::Lstm,
            vocab_size: 7,
            embed_dim: None,
            hidden_size: 4,
            num_layers: 1,
        };
        save_model(path, &CharRnn::random(config, &vocabulary, 1).unwrap()).unwrap();
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn test_legacy_gpuid_spelling() {
        let cli = parse(&["tinyrnn", "-gpuid", "-1", "model.bin", "in.css", "/tmp/out.css"]);

        assert_eq!(cli.gpuid, -1);
        assert_eq!(cli.model, PathBuf::from("model.bin"));
        assert_eq!(cli.input, PathBuf::from("in.css"));
        assert_eq!(cli.output, PathBuf::from("/tmp/out.css"));
    }

    #[test]
    fn test_gpuid_equals_form_and_default() {
        assert_eq!(parse(&["tinyrnn", "-gpuid=2", "m", "i", "o"]).gpuid, 2);
        assert_eq!(parse(&["tinyrnn", "m", "i", "o"]).gpuid, -1);
    }

    #[test]
    fn test_missing_positionals_rejected() {
        let args = normalize_args(["tinyrnn", "m", "i"].iter().map(OsString::from));
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_temperature_selects_sampling() {
        let cli = parse(&["tinyrnn", "--temperature", "0.8", "--seed", "5", "m", "i", "o"]);
        assert_eq!(
            cli.run_config().unwrap().decoding,
            DecodePolicy::Sampled { temperature: 0.8, seed: 5 }
        );

        let greedy = parse(&["tinyrnn", "m", "i", "o"]);
        assert_eq!(greedy.run_config().unwrap().decoding, DecodePolicy::Greedy);
    }

    #[test]
    fn test_bad_temperature_rejected() {
        let cli = parse(&["tinyrnn", "--temperature", "0", "m", "i", "o"]);
        assert!(cli.run_config().is_err());
    }

    fn cli_for(model: &std::path::Path, input: &std::path::Path, output: &std::path::Path) -> Cli {
        let args = [OsString::from("tinyrnn"), model.into(), input.into(), output.into()];
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_run_writes_output() {
        let dir = tempdir().unwrap();
        let (model, input, output) =
            (dir.path().join("m.bin"), dir.path().join("in.css"), dir.path().join("out.css"));
        save_small_model(&model);
        fs::write(&input, "a{b:a;}").unwrap();

        let cli = cli_for(&model, &input, &output);
        cli.run().unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap().chars().count(), 7);
    }

    #[test]
    fn test_missing_model_fails_and_clears_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.css");
        let output = dir.path().join("out.css");
        fs::write(&input, "a{}").unwrap();
        fs::write(&output, "stale").unwrap();

        let missing = dir.path().join("absent.bin");
        let cli = cli_for(&missing, &input, &output);

        let err = cli.run().unwrap_err();
        assert!(err.to_string().contains("loading model"), "{err:#}");
        assert!(!output.exists());
    }

    #[test]
    fn test_bad_input_fails_and_clears_output() {
        let dir = tempdir().unwrap();
        let (model, input, output) =
            (dir.path().join("m.bin"), dir.path().join("in.css"), dir.path().join("out.css"));
        save_small_model(&model);
        fs::write(&input, [0x61, 0xff]).unwrap();
        fs::write(&output, "stale").unwrap();

        let cli = cli_for(&model, &input, &output);

        assert!(cli.run().is_err());
        assert!(!output.exists());
    }
}
