//! Ranks post categories by how often they occur. [`count_categories`] and
//! [`rank_categories_by_frequency`] work over anything that is
//! [`Categorized`]; [`CategoryIndex`] attaches slugs, URLs and member posts to
//! the ranking for the site build.

use std::collections::{HashMap, HashSet};
use std::fmt;

use gtmpl_value::Value;
use tracing::warn;
use url::{ParseError, Url};

use crate::post::Post;

/// Anything that carries an ordered list of category labels.
pub trait Categorized {
    fn categories(&self) -> &[String];
}

impl Categorized for Vec<String> {
    fn categories(&self) -> &[String] {
        self
    }
}

impl Categorized for Option<Vec<String>> {
    /// A missing category list contributes nothing.
    fn categories(&self) -> &[String] {
        self.as_deref().unwrap_or(&[])
    }
}

impl<T: Categorized + ?Sized> Categorized for &T {
    fn categories(&self) -> &[String] {
        (**self).categories()
    }
}

/// A category label and the number of times it occurs across a set of
/// posts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

impl fmt::Display for CategoryCount {
    /// Formats the count as a `{name}\t{count}` listing line.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.count)
    }
}

/// Tallies every category occurrence across `posts` and returns the counts
/// ordered by descending count. Labels with equal counts stay in the order
/// they were first encountered while walking the posts (and each post's
/// categories) in input order. A label repeated within one post counts once
/// per occurrence.
pub fn count_categories<P: Categorized>(posts: &[P]) -> Vec<CategoryCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for post in posts {
        for category in post.categories() {
            match positions.get(category.as_str()) {
                Some(&i) => counts[i].count += 1,
                None => {
                    positions.insert(category.as_str(), counts.len());
                    counts.push(CategoryCount {
                        name: category.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    // `sort_by` is stable, so ties keep first-appearance order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Returns the distinct category labels across `posts`, most frequent first.
/// See [`count_categories`] for the ordering rules.
pub fn rank_categories_by_frequency<P: Categorized>(posts: &[P]) -> Vec<String> {
    count_categories(posts)
        .into_iter()
        .map(|category| category.name)
        .collect()
}

/// A ranked category along with everything needed to link to and render its
/// index pages.
#[derive(Debug)]
pub struct Category<'a> {
    /// The label as written in the posts' frontmatter.
    pub name: String,

    /// The slugified label. Unique within a [`CategoryIndex`].
    pub slug: String,

    /// The number of occurrences across all posts.
    pub count: usize,

    /// The directory URL for the category's index pages, i.e.,
    /// `{categories_url}/{slug}/`.
    pub base_url: Url,

    /// The URL of the category's first index page.
    pub url: Url,

    /// The posts filed under this category, in the same order as the posts
    /// the index was built from.
    pub posts: Vec<&'a Post>,
}

/// The site's categories in ranked order.
#[derive(Debug, Default)]
pub struct CategoryIndex<'a> {
    categories: Vec<Category<'a>>,
    by_name: HashMap<String, usize>,
}

impl<'a> CategoryIndex<'a> {
    /// Ranks the categories of `posts` and resolves each one's slug and URLs
    /// against `categories_url`, which should end in a trailing slash.
    pub fn new(
        posts: &'a [Post],
        categories_url: &Url,
    ) -> Result<CategoryIndex<'a>, ParseError> {
        let mut index = CategoryIndex::default();
        let mut slugs: HashSet<String> = HashSet::new();

        for CategoryCount { name, count } in count_categories(posts) {
            let mut base = slug::slugify(&name);
            if base.is_empty() {
                base = String::from("uncategorized");
            }
            let mut slug = base.clone();
            let mut suffix = 1;
            while slugs.contains(&slug) {
                suffix += 1;
                slug = format!("{}-{}", base, suffix);
            }
            if suffix > 1 {
                warn!(
                    category = name.as_str(),
                    slug = slug.as_str(),
                    "category slug collides with another category"
                );
            }
            slugs.insert(slug.clone());

            // `slug` has no trailing slash, so it has to be added explicitly
            // or `Url::join` would treat it as a file name and drop it.
            let base_url = categories_url.join(&format!("{}/", slug))?;
            let url = base_url.join("index.html")?;
            let members = posts
                .iter()
                .filter(|post| post.categories.contains(&name))
                .collect();

            index.by_name.insert(name.clone(), index.categories.len());
            index.categories.push(Category {
                name,
                slug,
                count,
                base_url,
                url,
                posts: members,
            });
        }

        Ok(index)
    }

    /// Looks up a category by its label.
    pub fn get(&self, name: &str) -> Option<&Category<'a>> {
        self.by_name.get(name).map(|&i| &self.categories[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category<'a>> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Converts the index into a template [`Value`]: an array of category
    /// objects (see `From<&Category> for Value`) in ranked order.
    pub fn to_value(&self) -> Value {
        Value::Array(self.categories.iter().map(Value::from).collect())
    }
}

impl From<&Category<'_>> for Value {
    /// Converts a [`Category`] into an object with `name`, `slug`, `url` and
    /// `count` fields.
    fn from(c: &Category) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&c.name).into());
        m.insert("slug".to_owned(), (&c.slug).into());
        m.insert("url".to_owned(), Value::String(c.url.to_string()));
        m.insert("count".to_owned(), Value::from(c.count as i64));
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;

    fn posts(categories: &[&[&str]]) -> Vec<Vec<String>> {
        categories
            .iter()
            .map(|cs| cs.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn counts(pairs: &[(&str, usize)]) -> Vec<CategoryCount> {
        pairs
            .iter()
            .map(|&(name, count)| CategoryCount {
                name: name.to_owned(),
                count,
            })
            .collect()
    }

    #[test]
    fn test_rank_most_frequent_first() {
        let posts = posts(&[&["go", "rust"], &["go"], &["ts"]]);
        assert_eq!(vec!["go", "rust", "ts"], rank_categories_by_frequency(&posts));
    }

    #[test]
    fn test_rank_counts_duplicates_within_post() {
        let posts = posts(&[&[], &["a", "a"]]);
        assert_eq!(counts(&[("a", 2)]), count_categories(&posts));
        assert_eq!(vec!["a"], rank_categories_by_frequency(&posts));
    }

    #[test]
    fn test_rank_ties_keep_first_appearance() {
        let posts = posts(&[&["x"], &["y"], &["x"], &["y"], &["z"]]);
        assert_eq!(
            counts(&[("x", 2), ("y", 2), ("z", 1)]),
            count_categories(&posts)
        );
        assert_eq!(vec!["x", "y", "z"], rank_categories_by_frequency(&posts));
    }

    #[test]
    fn test_rank_tie_order_follows_traversal_not_label() {
        let posts = posts(&[&["zebra", "apple"], &["mango"], &["apple", "zebra"]]);
        assert_eq!(
            vec!["zebra", "apple", "mango"],
            rank_categories_by_frequency(&posts)
        );
    }

    #[test]
    fn test_rank_empty_input() {
        let posts: Vec<Vec<String>> = Vec::new();
        assert!(rank_categories_by_frequency(&posts).is_empty());
    }

    #[test]
    fn test_rank_missing_categories() {
        let posts = vec![None, Some(vec!["b".to_owned()]), None];
        assert_eq!(vec!["b"], rank_categories_by_frequency(&posts));
    }

    #[test]
    fn test_rank_is_complete_and_descending() {
        let posts = posts(&[
            &["c", "b"],
            &["a", "b", "c"],
            &["d"],
            &["b", "e", "a"],
            &[],
            &["e", "e"],
        ]);
        let counted = count_categories(&posts);

        let mut names: Vec<&str> = counted.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(vec!["a", "b", "c", "d", "e"], names);

        for pair in counted.windows(2) {
            assert!(pair[0].count >= pair[1].count, "{:?}", pair);
        }
        assert_eq!(
            counts(&[("b", 3), ("e", 3), ("c", 2), ("a", 2), ("d", 1)]),
            counted
        );
    }

    fn post(id: &str, categories: &[&str]) -> Post {
        Post {
            id: id.to_owned(),
            title: id.to_owned(),
            date: String::from("2021-01-01"),
            description: None,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            url: Url::parse(&format!("https://example.org/posts/{}.html", id)).unwrap(),
            file_path: PathBuf::from(format!("{}.html", id)),
            body: String::new(),
        }
    }

    #[test]
    fn test_category_index() -> Result<(), ParseError> {
        let posts = vec![
            post("one", &["Rust", "featured"]),
            post("two", &["featured"]),
            post("three", &["Rust", "featured"]),
        ];
        let categories_url = Url::parse("https://example.org/categories/")?;
        let index = CategoryIndex::new(&posts, &categories_url)?;

        let names: Vec<&str> = index.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(vec!["featured", "Rust"], names);

        let rust = index.get("Rust").unwrap();
        assert_eq!("rust", rust.slug);
        assert_eq!(2, rust.count);
        assert_eq!(
            "https://example.org/categories/rust/index.html",
            rust.url.as_str()
        );
        let ids: Vec<&str> = rust.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(vec!["one", "three"], ids);
        assert!(index.get("rust").is_none());
        Ok(())
    }

    #[test]
    fn test_category_index_disambiguates_slugs() -> Result<(), ParseError> {
        let posts = vec![post("one", &["Rust", "rust"]), post("two", &["Rust"])];
        let categories_url = Url::parse("https://example.org/categories/")?;
        let index = CategoryIndex::new(&posts, &categories_url)?;

        assert_eq!("rust", index.get("Rust").unwrap().slug);
        assert_eq!("rust-2", index.get("rust").unwrap().slug);
        Ok(())
    }

    #[test]
    fn test_category_count_display() {
        let count = CategoryCount {
            name: String::from("rust"),
            count: 2,
        };
        assert_eq!("rust\t2", count.to_string());
    }

    #[test]
    fn test_category_index_suffix_skips_taken_slugs() -> Result<(), ParseError> {
        let posts = vec![
            post("one", &["Rust", "rust", "rust-2"]),
            post("two", &["Rust", "rust"]),
        ];
        let categories_url = Url::parse("https://example.org/categories/")?;
        let index = CategoryIndex::new(&posts, &categories_url)?;

        let slugs: Vec<(&str, &str)> = index
            .iter()
            .map(|c| (c.name.as_str(), c.slug.as_str()))
            .collect();
        assert_eq!(
            vec![("Rust", "rust"), ("rust", "rust-2"), ("rust-2", "rust-2-2")],
            slugs
        );
        Ok(())
    }
}
