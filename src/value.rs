//! Conversions from the site configuration into template [`Value`]s. Blank
//! optional fields become [`Value::Nil`] so templates can test them with
//! `{{ if .field }}`.

use std::collections::HashMap;

use gtmpl_value::Value;

use crate::config::{About, Author, Links, Project, Site, Timestamp};

fn object(fields: Vec<(&str, Value)>) -> Value {
    let mut m: HashMap<String, Value> = HashMap::with_capacity(fields.len());
    for (key, value) in fields {
        m.insert(key.to_owned(), value);
    }
    Value::Object(m)
}

fn optional(s: &Option<String>) -> Value {
    match s {
        Some(s) => s.into(),
        None => Value::Nil,
    }
}

fn strings(v: &[String]) -> Value {
    Value::Array(v.iter().map(Value::from).collect())
}

impl From<&Site> for Value {
    fn from(site: &Site) -> Value {
        object(vec![
            ("title", (&site.title).into()),
            ("description", (&site.description).into()),
            ("language", site.language.code().into()),
            ("site_url", Value::String(site.site_url.to_string())),
            ("og_image", optional(&site.og_image)),
            ("ga", optional(&site.ga)),
            ("dark", site.theme.dark.into()),
            ("author", (&site.author).into()),
        ])
    }
}

impl From<&Author> for Value {
    fn from(author: &Author) -> Value {
        object(vec![
            ("name", (&author.name).into()),
            (
                "bio",
                object(vec![
                    ("role", optional(&author.bio.role)),
                    ("description", strings(&author.bio.description)),
                    ("thumbnail", optional(&author.bio.thumbnail)),
                ]),
            ),
            (
                "social",
                object(vec![
                    ("github", optional(&author.social.github)),
                    ("linkedin", optional(&author.social.linkedin)),
                    ("email", optional(&author.social.email)),
                ]),
            ),
        ])
    }
}

impl From<&Links> for Value {
    fn from(links: &Links) -> Value {
        object(vec![
            ("github", optional(&links.github)),
            ("post", optional(&links.post)),
            ("google_play", optional(&links.google_play)),
            ("app_store", optional(&links.app_store)),
            ("demo", optional(&links.demo)),
        ])
    }
}

impl From<&Timestamp> for Value {
    fn from(t: &Timestamp) -> Value {
        object(vec![
            ("date", optional(&t.date)),
            ("activity", optional(&t.activity)),
            ("links", (&t.links).into()),
        ])
    }
}

impl From<&Project> for Value {
    fn from(p: &Project) -> Value {
        object(vec![
            ("title", optional(&p.title)),
            ("description", optional(&p.description)),
            ("tech_stack", strings(&p.tech_stack)),
            ("thumbnail_url", optional(&p.thumbnail_url)),
            ("links", (&p.links).into()),
        ])
    }
}

impl From<&About> for Value {
    fn from(about: &About) -> Value {
        object(vec![
            (
                "timestamps",
                Value::Array(about.timestamps.iter().map(Value::from).collect()),
            ),
            (
                "projects",
                Value::Array(about.projects.iter().map(Value::from).collect()),
            ),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{Bio, Social};

    fn get<'v>(value: &'v Value, key: &str) -> &'v Value {
        match value {
            Value::Object(m) => &m[key],
            _ => panic!("not an object"),
        }
    }

    fn string(value: &Value) -> &str {
        match value {
            Value::String(s) => s,
            _ => panic!("not a string"),
        }
    }

    fn is_nil(value: &Value) -> bool {
        matches!(value, Value::Nil)
    }

    #[test]
    fn test_author_value() {
        let author = Author {
            name: String::from("Tester"),
            bio: Bio {
                role: Some(String::from("Developer")),
                description: vec![String::from("curious")],
                thumbnail: None,
            },
            social: Social::default(),
        };
        let value = Value::from(&author);

        assert_eq!("Tester", string(get(&value, "name")));
        let bio = get(&value, "bio");
        assert_eq!("Developer", string(get(bio, "role")));
        assert!(is_nil(get(bio, "thumbnail")));
        match get(bio, "description") {
            Value::Array(items) => {
                let items: Vec<&str> = items.iter().map(string).collect();
                assert_eq!(vec!["curious"], items);
            }
            _ => panic!("not an array"),
        }
        assert!(is_nil(get(get(&value, "social"), "github")));
    }
}
