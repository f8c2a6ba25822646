//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::post`]), ranking their categories ([`crate::category`]),
//! rendering post, index, category and about pages ([`crate::write`]), and
//! copying the static source directory and post-bundle assets into the output
//! directory.

use crate::category::{count_categories, CategoryCount, CategoryIndex};
use crate::config::Config;
use crate::document::StaticDocument;
use crate::post::{Error as ParseError, Parser as PostParser, StaticFile};
use crate::write::{Error as WriteError, *};
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A summary of a finished build.
#[derive(Debug)]
pub struct Report {
    /// The number of published posts.
    pub posts: usize,

    /// The site's categories, most frequent first.
    pub categories: Vec<CategoryCount>,

    /// The number of HTML pages written.
    pub pages: usize,
}

/// Builds the site from a [`Config`] object. This calls into
/// [`PostParser::parse_posts`], [`CategoryIndex::new`] and
/// [`Writer::write_site`] which do the heavy-lifting. This function also
/// copies the static assets from source directory to the output directory.
pub fn build_site(config: &Config) -> Result<Report> {
    let post_parser = PostParser::new(&config.posts_url, &config.posts_output_directory);

    // collect all posts
    let (posts, static_files) = post_parser.parse_posts(&config.posts_source_directory)?;
    info!(posts = posts.len(), "parsed posts");

    let categories = CategoryIndex::new(&posts, &config.categories_url)
        .map_err(|e| Error::Parse(e.into()))?;
    debug!(categories = categories.len(), "ranked categories");

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;
    let category_template = parse_template(config.category_template.iter())?;
    let about_template = parse_template(config.about_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // The root output directory itself is left alone in case the user passed
    // the wrong directory.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.categories_output_directory)?;
    rmdir(&config.about_output_directory)?;
    rmdir(&config.static_output_directory)?;

    // write the post, index, category and about pages
    let document = StaticDocument::themed(config.site.theme.dark);
    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        category_template: &category_template,
        about_template: &about_template,
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        categories_output_directory: &config.categories_output_directory,
        about_output_directory: &config.about_output_directory,
        index_page_size: config.index_page_size,
        home_page: &config.home_page,
        static_url: &config.static_url,
        about_url: &config.about_url,
        site: &config.site,
        document: &document,
    };
    let pages = writer.write_site(&posts, &categories)?;

    // copy static directory and post-bundle assets
    if config.static_source_directory.is_dir() {
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    } else {
        debug!(
            dir = %config.static_source_directory.display(),
            "no static directory to copy"
        );
    }
    copy_static_files(&static_files)?;

    // copy /pages/index.html to /index.html
    std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    let report = Report {
        posts: posts.len(),
        categories: categories
            .iter()
            .map(|c| CategoryCount {
                name: c.name.clone(),
                count: c.count,
            })
            .collect(),
        pages,
    };
    info!(
        pages = report.pages,
        output = %config.root_output_directory.display(),
        "built site"
    );
    Ok(report)
}

/// Parses the posts under the configured source directory and returns their
/// categories, most frequent first, without writing anything.
pub fn list_categories(config: &Config) -> Result<Vec<CategoryCount>> {
    let post_parser =
        PostParser::new(&config.posts_url, &config.posts_output_directory);
    let (posts, _) = post_parser.parse_posts(&config.posts_source_directory)?;
    Ok(count_categories(&posts))
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }

    Ok(())
}

fn copy_static_files(static_files: &[StaticFile]) -> Result<()> {
    for (src, dst) in static_files {
        if let Some(dir) = dst.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::copy(src, dst)?;
    }
    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, writing,
/// cleaning output directories, parsing template files, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing templates: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::read_to_string;

    #[test]
    fn test_build_site() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let out = tempfile::tempdir()?;
        let config = Config::from_directory(Path::new("./testdata/site"), out.path())?;
        let report = build_site(&config)?;

        assert_eq!(3, report.posts);
        let ranked: Vec<(&str, usize)> = report
            .categories
            .iter()
            .map(|c| (c.name.as_str(), c.count))
            .collect();
        assert_eq!(vec![("featured", 2), ("rust", 2), ("life", 1)], ranked);

        let root = out.path();
        for path in &[
            "index.html",
            "pages/index.html",
            "pages/1.html",
            "posts/first.html",
            "posts/second.html",
            "posts/bundled.html",
            "posts/bundled/diagram.txt",
            "categories/featured/index.html",
            "categories/rust/index.html",
            "categories/life/index.html",
            "about/index.html",
            "static/style.css",
        ] {
            assert!(root.join(path).is_file(), "missing {}", path);
        }
        assert!(!root.join("posts/draft.html").exists());

        let post = read_to_string(root.join("posts/second.html"))?;
        assert!(post.contains(r#"<div class="utterances">"#), "{}", post);
        assert!(post.contains("<h2>Second</h2>"), "{}", post);

        let home = read_to_string(root.join("index.html"))?;
        assert_eq!(read_to_string(root.join("pages/index.html"))?, home);
        assert!(home.contains("featured(2) rust(2) life(1)"), "{}", home);

        // rebuilding over an existing output directory succeeds
        build_site(&config)?;
        Ok(())
    }

    #[test]
    fn test_list_categories() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let out = tempfile::tempdir()?;
        let config = Config::from_directory(Path::new("./testdata/site"), out.path())?;
        let listing: Vec<String> = list_categories(&config)?
            .iter()
            .map(CategoryCount::to_string)
            .collect();
        assert_eq!(vec!["featured\t2", "rust\t2", "life\t1"], listing);

        // listing never touches the output directory
        assert!(!out.path().join("posts").exists());
        Ok(())
    }

    #[test]
    fn test_missing_template_file() {
        let result = parse_template(vec![PathBuf::from("./testdata/missing.html")].iter());
        assert!(matches!(result, Err(Error::OpenTemplateFile { .. })));
    }
}
