use crate::config::SpiderConfig;
use crate::error::{AssemblyError, FragmentError};
use crate::fragment::{RawFragment, RawLink, RawLocation};
use crate::identity::{assign_id, extract_local_key};
use crate::normalize::{clean_line, normalize};
use crate::schema::{Link, Location, Meeting};
use crate::status::{classify, cue_text};
use serde_json::Value;
use time::PrimitiveDateTime;
use tracing::debug;
use url::{ParseError, Url};

#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    config: &'a SpiderConfig,
    now: PrimitiveDateTime,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a SpiderConfig, now: PrimitiveDateTime) -> Self {
        Self { config, now }
    }

    pub fn config(&self) -> &'a SpiderConfig {
        self.config
    }

    pub fn assemble(&self, fragment: &RawFragment) -> Result<Meeting, AssemblyError> {
        let local_key = extract_local_key(fragment, &self.config.portal_origin)?;
        self.assemble_with_key(fragment, &local_key)
    }

    /// [`Assembler::assemble`], with failures tagged by position and id.
    pub fn assemble_at(&self, position: usize, fragment: &RawFragment) -> Result<Meeting, FragmentError> {
        let local_key = extract_local_key(fragment, &self.config.portal_origin)
            .map_err(|kind| FragmentError::new(position, None, kind))?;
        self.assemble_with_key(fragment, &local_key).map_err(|kind| {
            FragmentError::new(position, Some(assign_id(&self.config.name, &local_key)), kind)
        })
    }

    /// Decodes one element of the fragment file, then [`Assembler::assemble_at`].
    pub fn assemble_value_at(&self, position: usize, value: &Value) -> Result<Meeting, FragmentError> {
        let fragment =
            RawFragment::from_value(value).map_err(|kind| FragmentError::new(position, None, kind))?;
        self.assemble_at(position, &fragment)
    }

    fn assemble_with_key(&self, fragment: &RawFragment, local_key: &str) -> Result<Meeting, AssemblyError> {
        let id = assign_id(&self.config.name, local_key);
        let fields = normalize(fragment)?;
        let location = self.resolve_location(fragment.location.as_ref())?;
        let links = fragment
            .links
            .iter()
            .enumerate()
            .map(|(index, link)| self.resolve_link(index, link))
            .collect::<Result<Vec<_>, _>>()?;
        let source = self.resolve_source(fragment.source.as_deref())?;

        let status = classify(
            fields.start,
            self.now,
            &cue_text(&[
                fields.title.as_str(),
                fields.description.as_str(),
                fields.time_notes.as_str(),
                fields.status_text.as_str(),
            ]),
            &self.config.cues,
        );

        let title = if fields.title.is_empty() {
            self.config.default_title.clone()
        } else {
            fields.title
        };

        let meeting = Meeting {
            title,
            description: fields.description,
            classification: self.config.classification,
            start: fields.start,
            end: fields.end,
            all_day: fields.all_day,
            time_notes: fields.time_notes,
            location,
            links,
            source,
            status,
            id,
        };
        debug!(id = %meeting.id, start = %meeting.start, status = %meeting.status, "assembled meeting");
        Ok(meeting)
    }

    fn resolve_location(&self, raw: Option<&RawLocation>) -> Result<Location, AssemblyError> {
        let Some(raw) = raw else {
            return self
                .config
                .default_location
                .clone()
                .ok_or_else(|| AssemblyError::InvalidLocation {
                    reason: "no location given and no default configured".to_string(),
                });
        };

        let name = clean_line(raw.name.as_deref());
        let address = match raw.address.as_deref() {
            Some(address) => clean_line(Some(address)),
            // A bare venue name that matches the default venue borrows its address.
            None => self
                .config
                .default_location
                .as_ref()
                .filter(|default| !name.is_empty() && default.name.eq_ignore_ascii_case(&name))
                .map(|default| default.address.clone())
                .unwrap_or_default(),
        };
        if address.is_empty() {
            return Err(AssemblyError::InvalidLocation {
                reason: format!("address is empty (location name {name:?})"),
            });
        }
        Ok(Location { name, address })
    }

    fn resolve_link(&self, index: usize, raw: &RawLink) -> Result<Link, AssemblyError> {
        let invalid = |reason: &str| AssemblyError::InvalidLink {
            index,
            reason: reason.to_string(),
        };
        let href = raw
            .href
            .as_deref()
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| invalid("href is missing or empty"))?;
        let title = raw
            .title
            .as_deref()
            .ok_or_else(|| invalid("title is missing"))?;

        let href = match Url::parse(href) {
            Ok(_) => href.to_string(),
            Err(ParseError::RelativeUrlWithoutBase) => self
                .config
                .portal_origin
                .join(href)
                .map_err(|e| invalid(&format!("cannot resolve href {href:?}: {e}")))?
                .to_string(),
            Err(e) => return Err(invalid(&format!("bad href {href:?}: {e}"))),
        };
        Ok(Link {
            href,
            title: clean_line(Some(title)),
        })
    }

    fn resolve_source(&self, raw: Option<&str>) -> Result<String, AssemblyError> {
        let origin = &self.config.portal_origin;
        let invalid = |url: &str| AssemblyError::InvalidSource {
            url: url.to_string(),
            origin: origin.to_string(),
        };

        let url = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => origin.join(raw).map_err(|_| invalid(raw))?,
            None => self.config.listing_url.clone().ok_or_else(|| invalid(""))?,
        };
        if !url.as_str().starts_with(origin.as_str()) {
            return Err(invalid(url.as_str()));
        }
        Ok(url.into())
    }
}
