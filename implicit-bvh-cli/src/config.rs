use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The configuration for a benchmark run.
#[derive(Debug, Deserialize, Serialize)]
pub struct BenchConfig {
    /// The number of triangles to generate for the scene.
    pub num_triangles: usize,

    /// The number of rays to cast against the scene.
    pub num_rays: usize,

    /// The number of points to test against the scene.
    pub num_points: usize,

    /// The seed for the scene and query generation.
    pub seed: u64,

    /// The thread counts to sweep over.
    pub thread_counts: Vec<usize>,

    /// The minimum number of traversals a single task must process.
    #[serde(default = "default_min_traversals")]
    pub min_traversals_per_thread: usize,
}

fn default_min_traversals() -> usize {
    100
}

impl BenchConfig {
    /// Reads the configuration from the provided reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the configuration from.
    pub fn read<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut toml = String::new();
        reader
            .read_to_string(&mut toml)
            .context("Failed to read the configuration")?;

        let config: BenchConfig =
            toml::from_str(&toml).context("Failed to parse the configuration")?;

        Ok(config)
    }

    /// Writes the configuration to the provided writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the configuration to.
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let toml =
            toml::to_string_pretty(&self).context("Failed to serialize the configuration")?;

        writer
            .write_all(toml.as_bytes())
            .context("Failed to write the configuration")?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_loading_config() {
        let config_data = include_bytes!("../configs/bench.toml");
        let config = BenchConfig::read(&config_data[..]).unwrap();

        assert!(config.num_triangles > 0);
        assert!(!config.thread_counts.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let config = BenchConfig {
            num_triangles: 1000,
            num_rays: 100,
            num_points: 100,
            seed: 7,
            thread_counts: vec![1, 4],
            min_traversals_per_thread: 50,
        };

        let mut buffer = Vec::new();
        config.write(&mut buffer).unwrap();

        let restored = BenchConfig::read(&buffer[..]).unwrap();

        assert_eq!(restored.num_triangles, config.num_triangles);
        assert_eq!(restored.thread_counts, config.thread_counts);
        assert_eq!(
            restored.min_traversals_per_thread,
            config.min_traversals_per_thread
        );
    }
}
