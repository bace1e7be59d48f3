//! One order-entry session: options loaded once, a buffer edited many times,
//! a workbook generated on demand.

use crate::buffer::EditBuffer;
use crate::config::Profile;
use crate::error::{Result, RxOrderError};
use crate::export::{inject, OutputArtifact};
use crate::options::{load_profile_options, ReferenceOptions};
use crate::schema::ColumnSchema;
use crate::source::{BaseDir, ByteSource};

/// Session state. Each session owns its buffer; sessions share nothing.
#[derive(Debug, Clone)]
pub struct Session {
    profile: Profile,
    source: ByteSource,
    options: ReferenceOptions,
    buffer: EditBuffer,
}

impl Session {
    /// Start a session whose template is located through the profile.
    pub fn from_profile(profile: Profile) -> Result<Self> {
        let source = profile.template_source(&BaseDir::detect());
        Self::start(profile, source)
    }

    /// Start a session reading the template from `source`.
    ///
    /// Option lists are loaded here, once. A load failure is fatal: the
    /// form cannot be shown without its dropdowns.
    pub fn start(profile: Profile, source: ByteSource) -> Result<Self> {
        profile.validate()?;
        let options = load_profile_options(&source, &profile)
            .map_err(|e| RxOrderError::OptionsUnavailable(e.to_string()))?;
        log::info!(
            "session ready: template {}, {} option lists",
            source.describe(),
            options.iter().count()
        );
        let buffer = EditBuffer::new(profile.columns.clone(), profile.rows);
        Ok(Self {
            profile,
            source,
            options,
            buffer,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.profile.columns
    }

    pub fn options(&self) -> &ReferenceOptions {
        &self.options
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut EditBuffer {
        &mut self.buffer
    }

    /// Replace the whole buffer (e.g. with one parsed from JSON).
    pub fn replace_buffer(&mut self, buffer: EditBuffer) -> Result<()> {
        if buffer.schema() != self.schema() {
            return Err(RxOrderError::Config(
                "buffer columns do not match the session schema".into(),
            ));
        }
        self.buffer = buffer;
        Ok(())
    }

    /// Parse JSON row records into a new buffer for this session.
    pub fn load_records_json(&mut self, json: &str) -> Result<()> {
        self.buffer = EditBuffer::from_json(self.profile.columns.clone(), self.profile.rows, json)?;
        Ok(())
    }

    /// Clear the buffer back to its initial empty state.
    pub fn reset(&mut self) {
        self.buffer.reset();
    }

    /// Generate a workbook from the current buffer.
    ///
    /// The template is read again on every call, so one generation never
    /// sees another's output and the buffer is left untouched.
    pub fn generate(&self) -> Result<OutputArtifact> {
        let template = self.source.load()?;
        let issues = self.buffer.selection_issues(&self.options);
        for issue in &issues {
            log::warn!("{issue}");
        }
        let artifact = inject(&template, &self.buffer, &self.profile)?;
        log::info!(
            "generated {} ({} bytes, {} order rows)",
            artifact.file_name,
            artifact.len(),
            self.buffer.used_rows()
        );
        Ok(artifact)
    }
}
