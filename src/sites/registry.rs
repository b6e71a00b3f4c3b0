use crate::config::SitesConfig;
use crate::sites::{SiteParser, WeWorkRemotelyParser};
use crate::ConfigError;

/// Ordered collection of site parsers; the first match wins
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn SiteParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry of every parser enabled in the configuration
    pub fn from_config(config: &SitesConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        if config.weworkremotely.enabled {
            registry.register(WeWorkRemotelyParser::from_entry(&config.weworkremotely)?);
        }

        Ok(registry)
    }

    /// Appends a parser; earlier registrations take precedence
    pub fn register(&mut self, parser: impl SiteParser + 'static) {
        tracing::debug!("Registered site parser: {}", parser.name());
        self.parsers.push(Box::new(parser));
    }

    /// Finds the first parser that accepts `url`
    pub fn resolve(&self, url: &str) -> Option<&dyn SiteParser> {
        self.parsers
            .iter()
            .find(|parser| parser.matches(url))
            .map(|parser| parser.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SiteParser> {
        self.parsers.iter().map(|parser| parser.as_ref())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
