use ttv_core::{CatalogResolver, Config};

#[derive(Clone, Debug, clap::Args)]
pub struct CheckArg {
    /// Also load the catalog.
    #[arg(long)]
    pub catalog: bool,
}

impl CheckArg {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        if self.catalog {
            let resolver = CatalogResolver::load(&config.catalog)?;
            tracing::info!(items = resolver.len(), "catalog is readable");
        }
        print!("{}", config.to_toml_string()?);
        tracing::info!(inboxes = config.inboxes.len(), "configuration is valid");
        Ok(())
    }
}
