//! AI image generation.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::utils::{Release, lock};

/// Width and height of every generated image.
pub const IMAGE_SIZE: u32 = 512;

////////////////////////////////////////// ImageStyle ////////////////////////////////////////////

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStyle {
    #[default]
    Realistic,
    Artistic,
    Cartoon,
    Anime,
    Sketch,
    OilPainting,
    Watercolor,
    Cyberpunk,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 8] = [
        ImageStyle::Realistic,
        ImageStyle::Artistic,
        ImageStyle::Cartoon,
        ImageStyle::Anime,
        ImageStyle::Sketch,
        ImageStyle::OilPainting,
        ImageStyle::Watercolor,
        ImageStyle::Cyberpunk,
    ];

    /// Identifier sent to the backend.
    pub fn id(&self) -> &'static str {
        match self {
            ImageStyle::Realistic => "realistic",
            ImageStyle::Artistic => "artistic",
            ImageStyle::Cartoon => "cartoon",
            ImageStyle::Anime => "anime",
            ImageStyle::Sketch => "sketch",
            ImageStyle::OilPainting => "oil_painting",
            ImageStyle::Watercolor => "watercolor",
            ImageStyle::Cyberpunk => "cyberpunk",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageStyle::Realistic => "Realistic",
            ImageStyle::Artistic => "Digital Art",
            ImageStyle::Cartoon => "Cartoon",
            ImageStyle::Anime => "Anime",
            ImageStyle::Sketch => "Sketch",
            ImageStyle::OilPainting => "Oil Painting",
            ImageStyle::Watercolor => "Watercolor",
            ImageStyle::Cyberpunk => "Cyberpunk",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug)]
pub struct ImageStyleParseError {
    pub invalid_value: String,
}

impl fmt::Display for ImageStyleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown image style: {}", self.invalid_value)
    }
}

impl std::error::Error for ImageStyleParseError {}

impl FromStr for ImageStyle {
    type Err = ImageStyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ImageStyle::ALL
            .into_iter()
            .find(|style| style.id() == wanted)
            .ok_or_else(|| ImageStyleParseError {
                invalid_value: s.to_string(),
            })
    }
}

//////////////////////////////////////// ImageGenerator ///////////////////////////////////////////

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    style: ImageStyle,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    file_name: String,
}

/// The most recently generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub file_name: String,
    pub prompt: String,
    pub style: ImageStyle,
}

#[derive(Debug, Default)]
struct ImageState {
    generating: bool,
    last: Option<GeneratedImage>,
}

#[derive(Debug, Clone)]
pub struct ImageGenerator {
    client: ApiClient,
    state: Arc<Mutex<ImageState>>,
}

impl ImageGenerator {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(ImageState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, ImageState> {
        lock(&self.state)
    }

    pub fn is_generating(&self) -> bool {
        self.state().generating
    }

    pub fn last_image(&self) -> Option<GeneratedImage> {
        self.state().last.clone()
    }

    /// Generates a 512x512 image.  A blank prompt, or a generation already
    /// in flight, is ignored.  Failures are logged and keep the last image.
    pub async fn generate(&self, prompt: &str, style: ImageStyle) -> bool {
        if prompt.trim().is_empty() {
            return false;
        }
        {
            let mut state = self.state();
            if state.generating {
                return false;
            }
            state.generating = true;
        }
        let _generating = Release::new(&self.state, |state: &mut ImageState| {
            state.generating = false
        });

        let request = GenerateRequest {
            prompt,
            style,
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
        };
        match self
            .client
            .post::<_, GenerateResponse>("/image/generate", &request)
            .await
        {
            Ok(response) if response.success => {
                self.state().last = Some(GeneratedImage {
                    file_name: response.file_name,
                    prompt: prompt.to_string(),
                    style,
                });
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(%style, error = %err, "image generation failed");
                false
            }
        }
    }

    /// Where the backend serves a generated image from.
    pub fn image_url(&self, image: &GeneratedImage) -> String {
        let path = format!("/uploads/generated_images/{}", image.file_name);
        match url::Url::parse(self.client.base_url()).and_then(|base| base.join(&path)) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{path}", self.client.base_url()),
        }
    }
}
