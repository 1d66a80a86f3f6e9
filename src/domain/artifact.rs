// Export artifact - a complete file ready for download
use bytes::Bytes;

pub const PNG_CONTENT_TYPE: &str = "image/png";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Png,
    Pdf,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Png => "png",
            ArtifactFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactFormat::Png => PNG_CONTENT_TYPE,
            ArtifactFormat::Pdf => PDF_CONTENT_TYPE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub format: ArtifactFormat,
    pub bytes: Bytes,
}

impl Artifact {
    pub fn for_chart(chart_key: &str, format: ArtifactFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: format!("chart-{}.{}", sanitize(chart_key), format.extension()),
            format,
            bytes: Bytes::from(bytes),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Keeps chart keys usable as file names.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_follows_chart_key() {
        let artifact = Artifact::for_chart("65f0a1-0", ArtifactFormat::Png, vec![0]);
        assert_eq!(artifact.filename, "chart-65f0a1-0.png");
        assert_eq!(artifact.content_type(), "image/png");

        let artifact = Artifact::for_chart("../etc/x", ArtifactFormat::Pdf, vec![0]);
        assert_eq!(artifact.filename, "chart-___etc_x.pdf");
    }
}
