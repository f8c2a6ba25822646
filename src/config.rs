//! Loads the project configuration: the site metadata in `devrun.yaml`
//! (author, bio, social links, comments, about page content) and the theme's
//! template list in `theme/theme.yaml`. Output and URL locations are derived
//! from the project layout.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::debug;
use url::Url;

use crate::util::open;

/// The name of the project file searched for in a directory and its
/// ancestors.
pub const PROJECT_FILE: &str = "devrun.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

/// The language the site is written in.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}

/// Deserializes an optional string, treating blank strings as absent. The
/// sample entries in a fresh project file are full of `''`.
fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// Deserializes a list of strings, dropping blank entries.
fn non_empty_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect())
}

/// The site's metadata, as written in `devrun.yaml`.
#[derive(Clone, Debug, Deserialize)]
pub struct Site {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub language: Language,

    /// The root URL of the published site.
    pub site_url: Url,

    /// Path to the Open Graph image, relative to the static directory.
    #[serde(default, deserialize_with = "non_empty")]
    pub og_image: Option<String>,

    /// Google Analytics tracking ID.
    #[serde(default, deserialize_with = "non_empty")]
    pub ga: Option<String>,

    #[serde(default)]
    pub comments: Comments,

    pub author: Author,

    #[serde(default)]
    pub about: About,

    #[serde(default)]
    pub theme: ThemeSettings,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Comments {
    #[serde(default)]
    pub utterances: Option<UtterancesSettings>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UtterancesSettings {
    /// The GitHub repository (`owner/name`) whose issues hold the comments.
    #[serde(default, deserialize_with = "non_empty")]
    pub repo: Option<String>,
}

impl Comments {
    /// The utterances repository, if comments are enabled.
    pub fn utterances_repo(&self) -> Option<&str> {
        self.utterances.as_ref()?.repo.as_deref()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ThemeSettings {
    /// Renders pages with the `dark` body class.
    #[serde(default)]
    pub dark: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub bio: Bio,

    #[serde(default)]
    pub social: Social,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Bio {
    #[serde(default, deserialize_with = "non_empty")]
    pub role: Option<String>,

    /// Short phrases describing the author, shown one after another.
    #[serde(default, deserialize_with = "non_empty_seq")]
    pub description: Vec<String>,

    /// Path to the author's picture, relative to the static directory.
    #[serde(default, deserialize_with = "non_empty")]
    pub thumbnail: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Social {
    #[serde(default, deserialize_with = "non_empty")]
    pub github: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub linkedin: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub email: Option<String>,
}

/// Content for the about page.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct About {
    #[serde(default)]
    pub timestamps: Vec<Timestamp>,

    #[serde(default)]
    pub projects: Vec<Project>,
}

/// A dated entry in the author's timeline.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Timestamp {
    #[serde(default, deserialize_with = "non_empty")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub activity: Option<String>,

    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "non_empty")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "non_empty_seq")]
    pub tech_stack: Vec<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Links {
    #[serde(default, deserialize_with = "non_empty")]
    pub github: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub post: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub google_play: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub app_store: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub demo: Option<String>,
}

impl About {
    /// Drops the blank sample entries a fresh project file carries: timeline
    /// entries without a date or activity and projects without a title.
    fn without_placeholders(self) -> About {
        About {
            timestamps: self
                .timestamps
                .into_iter()
                .filter(|t| t.date.is_some() && t.activity.is_some())
                .collect(),
            projects: self
                .projects
                .into_iter()
                .filter(|p| p.title.is_some())
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct ProjectFile {
    #[serde(flatten)]
    site: Site,

    #[serde(default)]
    index_page_size: PageSize,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
    category_template: Vec<PathBuf>,
    about_template: Vec<PathBuf>,
}

/// Everything needed to build a site, resolved from the project file, the
/// theme file, and the output directory.
pub struct Config {
    pub site: Site,
    pub posts_source_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub home_page: Url,
    pub index_url: Url,
    pub posts_url: Url,
    pub categories_url: Url,
    pub about_url: Url,
    pub static_url: Url,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub category_template: Vec<PathBuf>,
    pub about_template: Vec<PathBuf>,
    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub categories_output_directory: PathBuf,
    pub about_output_directory: PathBuf,
    pub static_output_directory: PathBuf,
    pub index_page_size: usize,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a `devrun.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        for candidate in dir.ancestors() {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                debug!(path = %path.display(), "found project file");
                return Config::from_project_file(&path, output_directory);
            }
        }
        Err(Error::MissingProjectFile(dir.to_owned()))
    }

    /// Loads the project file at `path` and the theme file at
    /// `{project_root}/theme/theme.yaml`.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: ProjectFile = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|e| {
                Error::Annotated(
                    format!("parsing `{}`", path.display()),
                    Box::new(Error::from(e)),
                )
            })?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::MissingParentDirectory(path.to_owned()))?;

        let theme_dir = project_root.join("theme");
        let theme_path = theme_dir.join("theme.yaml");
        let theme: Theme = serde_yaml::from_reader(open(&theme_path, "theme")?)
            .map_err(|e| {
                Error::Annotated(
                    format!("parsing `{}`", theme_path.display()),
                    Box::new(Error::from(e)),
                )
            })?;
        let in_theme = |relpaths: Vec<PathBuf>| -> Vec<PathBuf> {
            relpaths.iter().map(|relpath| theme_dir.join(relpath)).collect()
        };

        let mut site = project.site;
        site.site_url = with_trailing_slash(site.site_url);
        site.about = site.about.without_placeholders();
        let site_url = site.site_url.clone();

        Ok(Config {
            posts_source_directory: project_root.join("posts"),
            static_source_directory: theme_dir.join("static"),
            home_page: site_url.clone(),
            index_url: site_url.join("pages/")?,
            posts_url: site_url.join("posts/")?,
            categories_url: site_url.join("categories/")?,
            about_url: site_url.join("about/")?,
            static_url: site_url.join("static/")?,
            index_template: in_theme(theme.index_template),
            posts_template: in_theme(theme.posts_template),
            category_template: in_theme(theme.category_template),
            about_template: in_theme(theme.about_template),
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("posts"),
            categories_output_directory: output_directory.join("categories"),
            about_output_directory: output_directory.join("about"),
            static_output_directory: output_directory.join("static"),
            index_page_size: project.index_page_size.0.max(1),
            site,
        })
    }
}

// `Url::join` treats a final path segment without a trailing slash as a file
// name and replaces it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project or theme configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `devrun.yaml` exists in the directory or any of its
    /// ancestors.
    MissingProjectFile(PathBuf),

    /// Returned when the project file path has no parent directory.
    MissingParentDirectory(PathBuf),

    /// Returned when a configuration file isn't valid YAML or doesn't match
    /// the expected structure.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a site URL can't be derived from `site_url`.
    UrlParse(url::ParseError),

    /// Returned for I/O errors opening configuration files.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingProjectFile(dir) => write!(
                f,
                "Could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::MissingParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file `{}`",
                path.display()
            ),
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingProjectFile(_) => None,
            Error::MissingParentDirectory(_) => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
