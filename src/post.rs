//! Defines the [`Post`], [`Parser`], and [`Error`] types, and the logic for
//! parsing posts from the file system into memory. See [`Post::to_value`] and
//! [`Post::summarize`] for details on how posts are converted into template
//! values.

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    path::{Component, Path, PathBuf},
};

use chrono::NaiveDate;
use gtmpl_value::Value;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use url::Url;
use walkdir::{DirEntry, WalkDir};

use crate::{category::CategoryIndex, category::Categorized, markdown};

const MARKDOWN_EXTENSION: &str = ".md";
const BUNDLE_INDEX: &str = "index.md";
const FOLD_TAG: &str = "<!-- more -->";

/// A single blog post, parsed and rendered to HTML.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The source path relative to the posts directory, less its extension,
    /// or the bundle directory's relative path. Uses `/` as separator.
    pub id: String,

    /// The title of the post.
    pub title: String,

    /// The date of the post. Always begins with a `YYYY-MM-DD` date.
    pub date: String,

    /// An optional short description, used as the summary when the post has
    /// no fold.
    pub description: Option<String>,

    /// The post's category labels in frontmatter order. Duplicates are kept.
    pub categories: Vec<String>,

    /// The URL of the rendered post page.
    pub url: Url,

    /// The output location of the rendered post page.
    pub file_path: PathBuf,

    /// The rendered HTML body.
    pub body: String,
}

impl Categorized for Post {
    fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl Post {
    /// Returns the part of the body above the `<!-- more -->` fold, and
    /// whether the body was actually folded. Without a fold, the description
    /// is used if there is one, otherwise the whole body.
    pub fn summary(&self) -> (&str, bool) {
        match self.body.find(FOLD_TAG) {
            Some(i) => (&self.body[..i], true),
            None => match &self.description {
                Some(description) => (description, true),
                None => (&self.body, false),
            },
        }
    }

    /// Converts the post's category labels into template values, linking
    /// each to its category index page when `categories` knows about it.
    fn categories_value(&self, categories: &CategoryIndex) -> Value {
        Value::Array(
            self.categories
                .iter()
                .map(|name| match categories.get(name) {
                    Some(category) => Value::from(category),
                    None => {
                        let mut m: HashMap<String, Value> = HashMap::new();
                        m.insert("name".to_owned(), name.into());
                        Value::Object(m)
                    }
                })
                .collect(),
        )
    }

    fn base_value(&self, categories: &CategoryIndex) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), (&self.id).into());
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert("title".to_owned(), (&self.title).into());
        m.insert("date".to_owned(), (&self.date).into());
        m.insert(
            "description".to_owned(),
            match &self.description {
                Some(description) => description.into(),
                None => Value::Nil,
            },
        );
        m.insert("categories".to_owned(), self.categories_value(categories));
        m
    }

    /// Converts the post into a template value for a post page: an object
    /// with `id`, `url`, `title`, `date`, `description`, `categories` and
    /// `body` fields.
    pub fn to_value(&self, categories: &CategoryIndex) -> Value {
        let mut m = self.base_value(categories);
        m.insert("body".to_owned(), (&self.body).into());
        Value::Object(m)
    }

    /// Converts the post into a template value for index pages. Same as
    /// [`Post::to_value`] except `body` is replaced by `summary` and
    /// `summarized` (whether the summary is shorter than the body).
    pub fn summarize(&self, categories: &CategoryIndex) -> Value {
        let (summary, summarized) = self.summary();
        let mut m = self.base_value(categories);
        m.insert("summary".to_owned(), summary.into());
        m.insert("summarized".to_owned(), summarized.into());
        Value::Object(m)
    }
}

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `posts_url` is the base URL for post pages (i.e., the URL for a post
    /// is `{posts_url}/{post_id}.html`). It should end in a trailing slash.
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(posts_url: &'a Url, posts_directory: &'a Path) -> Parser<'a> {
        Parser {
            posts_url,
            posts_directory,
        }
    }

    /// Recursively searches `source_directory` for post files (extension
    /// `.md`) and post bundles (directories containing an `index.md`) and
    /// returns the posts sorted by date (most recent first, then by id)
    /// along with the static files found in bundles. Drafts are skipped.
    /// Each post file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `date`, and optionally
    ///    `categories`, `description` and `draft`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// categories: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Posts> {
        let mut posts = Vec::new();
        let mut static_files = Vec::new();
        let mut entries = WalkDir::new(source_directory)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter();
        while let Some(result) = entries.next() {
            let entry = result?;
            // `entry` is always below `source_directory`
            let relative_path = entry
                .path()
                .strip_prefix(source_directory)
                .unwrap()
                .to_owned();
            let parsed = if Self::is_bundle(&entry) {
                // bundle contents are handled by `parse_post_bundle`
                entries.skip_current_dir();
                self.parse_post_bundle(
                    source_directory,
                    &relative_path,
                    &mut static_files,
                )?
            } else if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(MARKDOWN_EXTENSION)
            {
                self.parse_post(source_directory, &relative_path)?
            } else {
                continue;
            };

            match parsed {
                Some(post) => posts.push(post),
                None => debug!(file = %relative_path.display(), "skipping draft"),
            }
        }

        // Ties on date fall back to the id so the order, and with it the
        // category ranking, does not depend on the file system.
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        debug!(
            posts = posts.len(),
            static_files = static_files.len(),
            "parsed posts"
        );
        Ok((posts, static_files))
    }

    fn is_bundle(entry: &DirEntry) -> bool {
        entry.file_type().is_dir() && entry.path().join(BUNDLE_INDEX).is_file()
    }

    fn parse_post_bundle(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
        static_files: &mut Vec<StaticFile>,
    ) -> Result<Option<Post>> {
        // We want to make sure we can parse a post before we mutate
        // `static_files`
        let post = match self.parse_post(
            posts_source_directory,
            &relative_path.join(BUNDLE_INDEX),
        )? {
            Some(post) => post,
            None => return Ok(None),
        };

        let abs = posts_source_directory.join(relative_path);
        for result in WalkDir::new(&abs) {
            let entry = result?;
            if entry.file_type().is_file() && entry.file_name() != BUNDLE_INDEX {
                static_files.push((
                    entry.path().to_owned(),
                    self.posts_directory
                        .join(&post.id)
                        // strip_prefix shouldn't fail since `abs` is always an
                        // ancestor of `entry.path()`
                        .join(entry.path().strip_prefix(&abs).unwrap()),
                ));
            }
        }

        Ok(Some(post))
    }

    /// Parses a single post from `relative_path` (relative to
    /// `posts_source_directory`). Returns `None` for drafts.
    fn parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Option<Post>> {
        use std::io::Read;
        let path = posts_source_directory.join(relative_path);
        let mut contents = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| {
                Error::Annotated(
                    format!("reading post `{}`", path.display()),
                    Box::new(Error::Io(e)),
                )
            })?;

        let id = post_id(relative_path)?;
        self.parse_post_str(&id, &contents).map_err(|e| {
            Error::Annotated(
                format!("parsing post `{}`", relative_path.display()),
                Box::new(e),
            )
        })
    }

    /// Parses a single post with the given `id` from its source text.
    /// Returns `None` for drafts.
    pub fn parse_post_str(&self, id: &str, input: &str) -> Result<Option<Post>> {
        let (frontmatter, body) = split_frontmatter(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(frontmatter)?;
        if frontmatter.draft {
            return Ok(None);
        }

        let date = frontmatter.date.trim().to_owned();
        NaiveDate::parse_from_str(date.get(..10).unwrap_or(&date), "%Y-%m-%d")
            .map_err(|e| Error::InvalidDate(date.clone(), e))?;

        let file_name = format!("{}.html", id);
        let mut post = Post {
            id: id.to_owned(),
            title: frontmatter.title,
            date,
            description: frontmatter.description.filter(|d| !d.trim().is_empty()),
            categories: frontmatter.categories,
            url: self.posts_url.join(&file_name)?,
            file_path: self.posts_directory.join(&file_name),
            body: String::default(),
        };
        markdown::to_html(&mut post.body, body);
        Ok(Some(post))
    }
}

/// Splits a post's source into its YAML frontmatter and Markdown body.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => {
            let yaml_stop = FENCE.len() + offset;
            Ok((&input[FENCE.len()..yaml_stop], &input[yaml_stop + FENCE.len()..]))
        }
    }
}

/// Derives a post's ID from its path relative to the posts directory:
/// `foo.md` becomes `foo`, `foo/index.md` becomes `foo` and
/// `2021/foo.md` becomes `2021/foo`.
fn post_id(relative_path: &Path) -> Result<String> {
    let bundle = match relative_path.ends_with(BUNDLE_INDEX) {
        true => relative_path.parent().filter(|p| !p.as_os_str().is_empty()),
        false => None,
    };
    let path = match bundle {
        Some(dir) => dir.to_owned(),
        None => relative_path.with_extension(""),
    };
    let parts: Option<Vec<&str>> = path
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    parts
        .filter(|parts| !parts.is_empty())
        .map(|parts| parts.join("/"))
        .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()).into())
}

#[derive(Deserialize, Clone)]
struct Frontmatter {
    /// The title of the post.
    pub title: String,

    /// The date of the post.
    pub date: String,

    /// A short description of the post.
    #[serde(default)]
    pub description: Option<String>,

    /// The categories associated with the post.
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub categories: Vec<String>,

    /// Drafts aren't published.
    #[serde(default)]
    pub draft: bool,
}

/// Accepts categories either as a YAML sequence (`[rust, blog]`) or as a
/// single whitespace-separated string (`rust blog`). A null value is an empty
/// list.
fn deserialize_categories<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Categories {
        Words(String),
        List(Vec<String>),
    }

    Ok(match Option::<Categories>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Categories::Words(words)) => words.split_whitespace().map(str::to_owned).collect(),
        Some(Categories::List(list)) => list,
    })
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

pub type Posts = (Vec<Post>, Vec<StaticFile>);

/// A (source, destination) pair for a file that is copied verbatim into the
/// output directory.
pub type StaticFile = (PathBuf, PathBuf);

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the frontmatter `date` doesn't begin with a
    /// `YYYY-MM-DD` date.
    InvalidDate(String, chrono::ParseError),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate(date, err) => {
                write!(f, "invalid date `{}`: {}", date, err)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate(_, err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parser_fixture<T>(f: impl FnOnce(&Parser) -> Result<T>) -> Result<T> {
        let posts_url = Url::parse("https://example.org/posts/")?;
        let posts_directory = Path::new("/out/posts");
        f(&Parser::new(&posts_url, posts_directory))
    }

    #[test]
    fn test_parse_post_str() -> Result<()> {
        let post = parser_fixture(|parser| {
            parser.parse_post_str(
                "hello",
                "---\ntitle: Hello\ndate: 2021-04-16\ncategories: [rust, blog]\n---\n# Hi\n\nThere",
            )
        })?
        .unwrap();

        assert_eq!("hello", post.id);
        assert_eq!("Hello", post.title);
        assert_eq!("2021-04-16", post.date);
        assert_eq!(vec!["rust", "blog"], post.categories);
        assert_eq!("https://example.org/posts/hello.html", post.url.as_str());
        assert_eq!(PathBuf::from("/out/posts/hello.html"), post.file_path);
        assert_eq!("<h2>Hi</h2>\n<p>There</p>\n", post.body);
        Ok(())
    }

    #[test]
    fn test_categories_as_words() -> Result<()> {
        let post = parser_fixture(|parser| {
            parser.parse_post_str(
                "words",
                concat!(
                    "---\ntitle: Words\ndate: '2021-04-16 10:00:00'\n",
                    "categories: featured  react react\n---\n",
                ),
            )
        })?
        .unwrap();
        assert_eq!(vec!["featured", "react", "react"], post.categories);
        Ok(())
    }

    #[test]
    fn test_categories_missing_or_null() -> Result<()> {
        parser_fixture(|parser| {
            for source in &[
                "---\ntitle: T\ndate: 2021-04-16\n---\n",
                "---\ntitle: T\ndate: 2021-04-16\ncategories:\n---\n",
                "---\ntitle: T\ndate: 2021-04-16\ncategories: []\n---\n",
            ] {
                let post = parser.parse_post_str("t", source)?.unwrap();
                assert!(post.categories.is_empty(), "{}", source);
            }
            Ok(())
        })
    }

    #[test]
    fn test_draft_is_skipped() -> Result<()> {
        let post = parser_fixture(|parser| {
            parser.parse_post_str("d", "---\ntitle: D\ndate: 2021-04-16\ndraft: true\n---\n")
        })?;
        assert!(post.is_none());
        Ok(())
    }

    #[test]
    fn test_frontmatter_errors() {
        let result = parser_fixture(|parser| parser.parse_post_str("x", "title: X\n"));
        assert!(matches!(result, Err(Error::FrontmatterMissingStartFence)));

        let result = parser_fixture(|parser| parser.parse_post_str("x", "---\ntitle: X\n"));
        assert!(matches!(result, Err(Error::FrontmatterMissingEndFence)));

        let result = parser_fixture(|parser| {
            parser.parse_post_str("x", "---\ntitle: X\ndate: yesterday\n---\n")
        });
        assert!(matches!(result, Err(Error::InvalidDate(_, _))));
    }

    #[test]
    fn test_summary() -> Result<()> {
        parser_fixture(|parser| {
            let folded = parser
                .parse_post_str(
                    "f",
                    "---\ntitle: F\ndate: 2021-04-16\n---\nabove\n\n<!-- more -->\n\nbelow\n",
                )?
                .unwrap();
            assert_eq!(("<p>above</p>\n", true), folded.summary());

            let described = parser
                .parse_post_str(
                    "d",
                    "---\ntitle: D\ndate: 2021-04-16\ndescription: short\n---\nlong body\n",
                )?
                .unwrap();
            assert_eq!(("short", true), described.summary());

            let plain = parser
                .parse_post_str("p", "---\ntitle: P\ndate: 2021-04-16\n---\nbody\n")?
                .unwrap();
            assert_eq!(("<p>body</p>\n", false), plain.summary());
            Ok(())
        })
    }

    #[test]
    fn test_parse_posts() -> Result<()> {
        let posts_url = Url::parse("https://example.org/posts/")?;
        let posts_directory = Path::new("/out/posts");
        let parser = Parser::new(&posts_url, posts_directory);
        let (posts, static_files) = parser.parse_posts(Path::new("./testdata/site/posts/"))?;

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(vec!["bundled", "second", "first"], ids);
        assert_eq!(
            vec![(
                PathBuf::from("./testdata/site/posts/bundled/diagram.txt"),
                PathBuf::from("/out/posts/bundled/diagram.txt"),
            )],
            static_files
        );
        Ok(())
    }

    #[test]
    fn test_post_id() -> Result<()> {
        assert_eq!("foo", post_id(Path::new("foo.md"))?);
        assert_eq!("foo", post_id(Path::new("foo/index.md"))?);
        assert_eq!("index", post_id(Path::new("index.md"))?);
        assert_eq!("2021/foo", post_id(Path::new("2021/foo.md"))?);
        assert_eq!("2021/foo", post_id(Path::new("2021/foo/index.md"))?);
        Ok(())
    }

    fn write_post(
        dir: &Path,
        relative_path: &str,
        date: &str,
        categories: &str,
    ) -> std::io::Result<()> {
        let path = dir.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            path,
            format!(
                "---\ntitle: T\ndate: {}\ncategories: {}\n---\nbody\n",
                date, categories
            ),
        )
    }

    #[test]
    fn test_parse_posts_nested() -> Result<()> {
        let source = tempfile::tempdir()?;
        write_post(source.path(), "2021/nested.md", "2021-05-01", "[deep]")?;
        write_post(source.path(), "2021/trip/index.md", "2021-06-01", "[travel]")?;
        std::fs::write(source.path().join("2021/trip/map.png"), "png")?;

        let posts_url = Url::parse("https://example.org/posts/")?;
        let parser = Parser::new(&posts_url, Path::new("/out/posts"));
        let (posts, static_files) = parser.parse_posts(source.path())?;

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(vec!["2021/trip", "2021/nested"], ids);
        assert_eq!(
            "https://example.org/posts/2021/nested.html",
            posts[1].url.as_str()
        );
        assert_eq!(
            PathBuf::from("/out/posts/2021/nested.html"),
            posts[1].file_path
        );
        assert_eq!(
            vec![(
                source.path().join("2021/trip/map.png"),
                PathBuf::from("/out/posts/2021/trip/map.png"),
            )],
            static_files
        );
        Ok(())
    }

    #[test]
    fn test_same_date_posts_order_by_id() -> Result<()> {
        let source = tempfile::tempdir()?;
        // created out of id order
        write_post(source.path(), "zulu.md", "2021-01-01", "[y]")?;
        write_post(source.path(), "alpha.md", "2021-01-01", "[x]")?;
        write_post(source.path(), "newer.md", "2021-02-01", "[]")?;

        let posts_url = Url::parse("https://example.org/posts/")?;
        let parser = Parser::new(&posts_url, Path::new("/out/posts"));
        let (posts, _) = parser.parse_posts(source.path())?;

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(vec!["newer", "alpha", "zulu"], ids);
        assert_eq!(
            vec!["x", "y"],
            crate::category::rank_categories_by_frequency(&posts)
        );
        Ok(())
    }
}
