use crate::category::{Category, CategoryIndex};
use crate::comments::Utterances;
use crate::config::Site;
use crate::document::Document;
use crate::footer::PageFooter;
use crate::post::*;
use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Responsible for indexing, templating, and writing HTML pages to disk from
/// [`Post`] sources, the ranked categories, and the site metadata.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for the main index pages.
    pub index_template: &'a Template,

    /// The template for category index pages.
    pub category_template: &'a Template,

    /// The template for the about page.
    pub about_template: &'a Template,

    /// The base URL for the main index pages. They will be located at
    /// `{index_base_url}/index.html`, `{index_base_url}/1.html`, etc.
    pub index_base_url: &'a Url,

    /// The directory in which the main index HTML files will be written.
    pub index_output_directory: &'a Path,

    /// The directory in which category index pages will be written, one
    /// subdirectory per category slug: `{categories_output_directory}/{slug}/
    /// index.html`, `{categories_output_directory}/{slug}/1.html`, etc.
    pub categories_output_directory: &'a Path,

    /// The directory in which the about page (`index.html`) will be written.
    pub about_output_directory: &'a Path,

    /// The number of posts per index page.
    pub index_page_size: usize,

    /// The URL for the site's home page. This is made available to all
    /// templates, typically as the destination for the site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets. This is made available to all
    /// templates, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The URL of the about page, made available to all templates.
    pub about_url: &'a Url,

    /// The site metadata.
    pub site: &'a Site,

    /// The document the footer and comment widget are rendered against.
    pub document: &'a dyn Document,
}

impl Writer<'_> {
    /// The values every page template receives in addition to its own.
    fn globals(&self, categories: &CategoryIndex) -> HashMap<String, Value> {
        let footer = PageFooter {
            author: &self.site.author.name,
            github_url: self.site.author.social.github.as_deref().unwrap_or(""),
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), self.site.into());
        m.insert("categories".to_owned(), categories.to_value());
        m.insert("footer".to_owned(), footer.render().into());
        m.insert(
            "home_page".to_owned(),
            Value::String(self.home_page.to_string()),
        );
        m.insert(
            "static_url".to_owned(),
            Value::String(self.static_url.to_string()),
        );
        m.insert(
            "about_url".to_owned(),
            Value::String(self.about_url.to_string()),
        );
        m
    }

    /// The rendered comment widget, or an empty string if comments are
    /// disabled.
    fn comments(&self) -> String {
        match self.site.comments.utterances_repo().and_then(Utterances::new) {
            Some(widget) => widget.render(self.document),
            None => String::new(),
        }
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page, globals: &HashMap<String, Value>) -> Result<()> {
        let value = page.to_value(globals);
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        Ok(())
    }

    /// Writes the post pages, the main index, one index per category, and
    /// the about page. Returns the number of pages written.
    pub fn write_site(&self, posts: &[Post], categories: &CategoryIndex) -> Result<usize> {
        let globals = self.globals(categories);
        let comments = self.comments();
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut written = 0;

        for page in self.pages(posts, categories, &comments) {
            // every output path is joined onto a directory
            let dir = page.file_path.parent().unwrap();
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
            self.write_page(&page, &globals).map_err(|e| {
                Error::Annotated(
                    format!("writing `{}`", page.file_path.display()),
                    Box::new(e),
                )
            })?;
            written += 1;
        }

        debug!(pages = written, "wrote pages");
        Ok(written)
    }

    /// Creates every [`Page`] of the site.
    fn pages<'p>(
        &'p self,
        posts: &'p [Post],
        categories: &'p CategoryIndex,
        comments: &str,
    ) -> Vec<Page<'p>> {
        let mut pages = post_pages(posts, categories, self.posts_template, comments);

        let home = Index {
            url: self.index_base_url.to_owned(),
            output_directory: self.index_output_directory.to_owned(),
            posts: posts.iter().collect(),
            category: None,
        };
        pages.extend(home.to_pages(self.index_page_size, self.index_template, categories));

        for category in categories.iter() {
            let index = Index {
                url: category.base_url.clone(),
                output_directory: self.categories_output_directory.join(&category.slug),
                posts: category.posts.clone(),
                category: Some(category),
            };
            pages.extend(index.to_pages(
                self.index_page_size,
                self.category_template,
                categories,
            ));
        }

        pages.push(Page {
            item: (&self.site.about).into(),
            file_path: self.about_output_directory.join("index.html"),
            prev: None,
            next: None,
            template: self.about_template,
            extra: Vec::new(),
        });
        pages
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,

    /// Page-specific values beyond `item` (e.g., `comments` on post pages).
    extra: Vec<(&'static str, Value)>,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, and `next` (see [`Page`] for descriptions),
    /// the page's extra fields, and the site-wide `globals`.
    fn to_value(&self, globals: &HashMap<String, Value>) -> Value {
        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = globals.clone();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        for (key, value) in &self.extra {
            m.insert((*key).to_owned(), value.clone());
        }
        Value::Object(m)
    }
}

/// Creates all of the post [`Page`]s for a set of [`Post`]s. `prev` links to
/// the next-newer post and `next` to the next-older one.
fn post_pages<'a>(
    posts: &[Post],
    categories: &CategoryIndex,
    template: &'a Template,
    comments: &str,
) -> Vec<Page<'a>> {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| Page {
            item: post.to_value(categories),
            file_path: post.file_path.clone(),
            prev: match i < 1 {
                true => None,
                false => Some(posts[i - 1].url.clone()),
            },
            next: posts.get(i + 1).map(|p| p.url.clone()),
            template,
            extra: vec![("comments", comments.into())],
        })
        .collect()
}

/// `Index` represents a collection of [`Post`]s listed together: either the
/// main index containing all posts or the posts of one category.
struct Index<'a> {
    /// The base URL for the index's pages. Must end in a trailing slash.
    url: Url,

    /// The output directory for the index's pages.
    output_directory: PathBuf,

    /// The posts associated with the index.
    posts: Vec<&'a Post>,

    /// The category, for category indices.
    category: Option<&'a Category<'a>>,
}

impl Index<'_> {
    /// Converts the index to a list of index pages, `index_page_size` posts
    /// per page. An index without posts still gets one (empty) page so that
    /// its first page always exists.
    fn to_pages<'t>(
        &self,
        index_page_size: usize,
        index_template: &'t Template,
        categories: &CategoryIndex,
    ) -> Vec<Page<'t>> {
        let chunks: Vec<&[&Post]> = match self.posts.is_empty() {
            true => vec![&self.posts[..]],
            false => self.posts.chunks(index_page_size).collect(),
        };
        let total_pages = chunks.len();
        let extra = match self.category {
            Some(category) => vec![("category", Value::from(category))],
            None => Vec::new(),
        };

        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Page {
                item: Value::Array(chunk.iter().map(|p| p.summarize(categories)).collect()),
                file_path: self.output_directory.join(page_file_name(i)),
                prev: match i {
                    0 => None,
                    // joining a plain file name onto a base URL ending in a
                    // slash can't fail
                    _ => Some(self.url.join(&page_file_name(i - 1)).unwrap()),
                },
                next: match i + 1 < total_pages {
                    false => None,
                    true => Some(self.url.join(&page_file_name(i + 1)).unwrap()),
                },
                template: index_template,
                extra: extra.clone(),
            })
            .collect()
    }
}

fn page_file_name(i: usize) -> String {
    match i > 0 {
        false => String::from("index.html"),
        true => format!("{}.html", i),
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}
