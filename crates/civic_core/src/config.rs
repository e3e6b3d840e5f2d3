use crate::schema::{Classification, Location};
use crate::status::StatusCues;
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

const SPIDER_FILE: &str = "spider.toml";
const CUES_FILE: &str = "status_cues.yaml";

const TULOK_BOED_TOML: &str = include_str!("../../../config/tulok_boed/spider.toml");
const TULOK_BOED_CUES: &str = include_str!("../../../config/tulok_boed/status_cues.yaml");

/// Everything the core needs to know about one spider.
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    pub name: String,
    pub portal_origin: Url,
    pub classification: Classification,
    pub listing_url: Option<Url>,
    pub default_title: String,
    pub default_location: Option<Location>,
    pub cues: StatusCues,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpiderFile {
    name: String,
    portal_origin: String,
    classification: Classification,
    listing_url: Option<String>,
    default_title: Option<String>,
    default_location: Option<Location>,
}

impl SpiderConfig {
    /// Loads `spider.toml` and, when present, `status_cues.yaml` from `path`.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let spider_path = path.join(SPIDER_FILE);
        let spider_str = fs::read_to_string(&spider_path)
            .with_context(|| format!("reading {}", spider_path.display()))?;

        let cues_path = path.join(CUES_FILE);
        let cues_str = if cues_path.exists() {
            Some(
                fs::read_to_string(&cues_path)
                    .with_context(|| format!("reading {}", cues_path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(&spider_str, cues_str.as_deref())
            .with_context(|| format!("loading spider config from {}", path.display()))
    }

    /// The shipped `tulok_boed` configuration.
    pub fn tulok_boed() -> Result<Self> {
        Self::from_sources(TULOK_BOED_TOML, Some(TULOK_BOED_CUES))
    }

    pub fn new(name: &str, portal_origin: &str, classification: Classification) -> Result<Self> {
        let config = Self {
            name: name.to_string(),
            portal_origin: parse_origin(portal_origin)?,
            classification,
            listing_url: None,
            default_title: classification.as_str().to_string(),
            default_location: None,
            cues: StatusCues::default(),
        };
        config.check()?;
        Ok(config)
    }

    pub fn from_sources(spider_toml: &str, cues_yaml: Option<&str>) -> Result<Self> {
        let file: SpiderFile = toml::from_str(spider_toml).context("parsing spider.toml")?;
        let cues: StatusCues = match cues_yaml {
            Some(raw) => serde_yaml::from_str(raw).context("parsing status_cues.yaml")?,
            None => StatusCues::default(),
        };

        let portal_origin = parse_origin(&file.portal_origin)?;
        let listing_url = file
            .listing_url
            .as_deref()
            .map(|raw| Url::parse(raw.trim()).with_context(|| format!("listing_url {raw:?}")))
            .transpose()?;

        let config = Self {
            default_title: file
                .default_title
                .map(|title| title.trim().to_string())
                .unwrap_or_else(|| file.classification.as_str().to_string()),
            name: file.name.trim().to_string(),
            portal_origin,
            classification: file.classification,
            listing_url,
            default_location: file.default_location.map(|loc| Location {
                name: loc.name.trim().to_string(),
                address: loc.address.trim().to_string(),
            }),
            cues: cues.normalized(),
        };
        config.check()?;
        Ok(config)
    }

    pub fn origin(&self) -> &str {
        self.portal_origin.as_str()
    }

    pub fn id_prefix(&self) -> String {
        format!("{}/", self.name)
    }

    fn check(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("spider name must not be empty");
        }
        if self.name.contains('/') || self.name.chars().any(char::is_whitespace) {
            bail!("spider name {:?} must not contain '/' or whitespace", self.name);
        }
        if let Some(listing) = &self.listing_url {
            if !listing.as_str().starts_with(self.origin()) {
                bail!(
                    "listing_url {} is not under portal_origin {}",
                    listing,
                    self.origin()
                );
            }
        }
        if self.default_title.is_empty() {
            bail!("default_title must not be empty");
        }
        if let Some(loc) = &self.default_location {
            if loc.address.is_empty() {
                bail!("default_location.address must not be empty");
            }
        }
        Ok(())
    }
}

fn parse_origin(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("portal_origin {raw:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("portal_origin {raw:?} must be http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        bail!("portal_origin {raw:?} has no host");
    }
    if url.query().is_some() || url.fragment().is_some() {
        bail!("portal_origin {raw:?} must not carry a query or fragment");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
