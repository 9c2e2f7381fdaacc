//! Text-node translation over a markdown event stream.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use regex::Regex;

use crate::error::DocumentError;
use crate::translator::PhraseTranslator;

static SLUG_STRIP_REGEX: OnceLock<Regex> = OnceLock::new();
static SHORTCODE_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prepend a self-link anchor to every heading.
    pub heading_links: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            heading_links: true,
        }
    }
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Split text into leading whitespace, content and trailing whitespace.
pub fn split_whitespace(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}

/// Blank text and all-caps text (acronyms, constants) are left alone.
pub fn should_translate(text: &str) -> bool {
    !text.trim().is_empty() && text != text.to_uppercase()
}

/// Replace GitHub emoji shortcodes such as `:rocket:` with the emoji.
/// Unknown shortcodes are kept as written.
pub fn expand_shortcodes(text: &str) -> Cow<'_, str> {
    let re = SHORTCODE_REGEX.get_or_init(|| Regex::new(r":([a-z0-9_+\-]+):").unwrap());
    re.replace_all(text, |caps: &regex::Captures| {
        match emojis::get_by_shortcode(&caps[1]) {
            Some(emoji) => emoji.as_str().to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// GitHub-style heading slug: lower-cased, punctuation removed, spaces
/// turned into hyphens.
pub fn slugify(text: &str) -> String {
    let re = SLUG_STRIP_REGEX
        .get_or_init(|| Regex::new(r"[^\p{L}\p{M}\p{N}\p{Pc}\- ]").unwrap());
    re.replace_all(&text.trim().to_lowercase(), "")
        .replace(' ', "-")
}

/// Hands out unique slugs within one document: `intro`, `intro-1`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut slug = base.clone();
        while self.occurrences.contains_key(&slug) {
            let count = self.occurrences.entry(base.clone()).or_default();
            *count += 1;
            slug = format!("{}-{}", base, count);
        }
        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

fn anchor_html(slug: &str) -> String {
    format!(
        r##"<a id="{slug}" href="#{slug}" aria-hidden="true" tabindex="-1"><i class="fa fa-link mr-2 text-dark"></i></a>"##
    )
}

/// Merge runs of adjacent text events so each text node is translated whole.
fn coalesce_text<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut merged: Vec<Event<'a>> = Vec::new();
    for event in events {
        if let Event::Text(text) = &event {
            if let Some(Event::Text(previous)) = merged.last_mut() {
                let mut joined = String::from(&**previous);
                joined.push_str(text);
                *previous = CowStr::from(joined);
                continue;
            }
        }
        merged.push(event);
    }
    merged
}

/// One slug per heading, in document order, from the source text.
fn heading_slugs(events: &[Event<'_>]) -> Vec<String> {
    let mut slugger = Slugger::default();
    let mut slugs = Vec::new();
    let mut heading_text: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading(..)) => heading_text = Some(String::new()),
            Event::End(Tag::Heading(..)) => {
                if let Some(text) = heading_text.take() {
                    slugs.push(slugger.slug(&text));
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buffer) = heading_text.as_mut() {
                    buffer.push_str(text);
                }
            }
            _ => {}
        }
    }
    slugs
}

/// Translate the text nodes of a markdown document into `locale`.
///
/// Emoji shortcodes in text are expanded first. Text inside code blocks is
/// copied through, as are inline code and raw HTML, which are not text nodes.
pub async fn translate_document(
    path: &Path,
    source: &str,
    locale: &str,
    translator: &dyn PhraseTranslator,
    options: &RenderOptions,
) -> Result<String, DocumentError> {
    let events = coalesce_text(Parser::new_ext(source, parser_options()));
    let mut slugs = if options.heading_links {
        heading_slugs(&events).into_iter()
    } else {
        Vec::new().into_iter()
    };

    let mut output_events = Vec::with_capacity(events.len());
    let mut code_block_depth = 0usize;

    for event in events {
        match event {
            event @ Event::Start(Tag::CodeBlock(_)) => {
                code_block_depth = code_block_depth.saturating_add(1);
                output_events.push(event);
            }
            event @ Event::End(Tag::CodeBlock(_)) => {
                code_block_depth = code_block_depth.saturating_sub(1);
                output_events.push(event);
            }
            event @ Event::Start(Tag::Heading(..)) => {
                output_events.push(event);
                if let Some(slug) = slugs.next() {
                    output_events.push(Event::Html(CowStr::from(anchor_html(&slug))));
                }
            }
            Event::Text(text) if code_block_depth == 0 => {
                let text = expand_shortcodes(&text).into_owned();
                if !should_translate(&text) {
                    output_events.push(Event::Text(CowStr::from(text)));
                    continue;
                }
                let (pre, core, post) = split_whitespace(&text);
                let translated = translator.translate(core, locale).await.map_err(|source| {
                    DocumentError::Translate {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                output_events.push(Event::Text(CowStr::from(format!(
                    "{}{}{}",
                    pre, translated, post
                ))));
            }
            event => output_events.push(event),
        }
    }

    let mut output = String::new();
    pulldown_cmark_to_cmark::cmark(output_events.iter(), &mut output).map_err(|_| {
        DocumentError::Render {
            path: path.to_path_buf(),
        }
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shout(phrase: &str, _locale: &str) -> String {
        format!("{}!", phrase.to_uppercase())
    }

    async fn render(source: &str, heading_links: bool) -> String {
        translate_document(
            Path::new("doc.md"),
            source,
            "fr",
            &shout,
            &RenderOptions { heading_links },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_split_whitespace() {
        assert_eq!(split_whitespace("  hi there \n"), ("  ", "hi there", " \n"));
        assert_eq!(split_whitespace("plain"), ("", "plain", ""));
        assert_eq!(split_whitespace("   "), ("   ", "", ""));
        assert_eq!(split_whitespace(""), ("", "", ""));
    }

    #[test]
    fn test_should_translate() {
        assert!(should_translate("Hello"));
        assert!(!should_translate("   "));
        assert!(!should_translate("NASA"));
        assert!(!should_translate("API V2"));
        assert!(should_translate("Api v2"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's new?"), "whats-new");
        assert_eq!(slugify("snake_case and-dash"), "snake_case-and-dash");
        assert_eq!(slugify("Ünïcode Títle"), "ünïcode-títle");
    }

    #[test]
    fn test_slugger_deduplicates() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("Intro"), "intro");
        assert_eq!(slugger.slug("Intro"), "intro-1");
        assert_eq!(slugger.slug("Intro"), "intro-2");
        assert_eq!(slugger.slug("Intro 1"), "intro-1-1");
    }

    #[tokio::test]
    async fn test_heading_translated() {
        let output = render("# Hello\n", false).await;
        assert!(output.contains("# HELLO!"), "{output}");
    }

    #[tokio::test]
    async fn test_heading_links() {
        let output = render("# Hello\n\n## Hello\n", true).await;
        assert!(output.contains(
            r##"<a id="hello" href="#hello" aria-hidden="true" tabindex="-1"><i class="fa fa-link mr-2 text-dark"></i></a>HELLO!"##
        ), "{output}");
        assert!(output.contains(r#"id="hello-1""#), "{output}");
    }

    #[tokio::test]
    async fn test_code_blocks_untouched() {
        let output = render("Run this\n\n```\nlet x = 1;\n```\n", false).await;
        assert!(output.contains("RUN THIS!"), "{output}");
        assert!(output.contains("let x = 1;"), "{output}");
        assert!(!output.contains("LET X"), "{output}");
    }

    #[tokio::test]
    async fn test_inline_code_and_acronyms_untouched() {
        let output = render("Call `fetch` now\n\nNASA\n", false).await;
        assert!(output.contains("`fetch`"), "{output}");
        assert!(output.contains("CALL!"), "{output}");
        assert!(output.contains("NASA"), "{output}");
        assert!(!output.contains("NASA!"), "{output}");
    }

    #[tokio::test]
    async fn test_whitespace_preserved_around_text() {
        let output = render("Hello *world* again\n", false).await;
        assert!(output.contains("HELLO! *WORLD!* AGAIN!"), "{output}");
    }

    #[tokio::test]
    async fn test_translation_error_names_file() {
        use crate::error::ProviderError;
        use futures::future::BoxFuture;
        use futures::FutureExt;

        struct Broken;
        impl PhraseTranslator for Broken {
            fn translate<'a>(
                &'a self,
                _phrase: &'a str,
                _locale: &'a str,
            ) -> BoxFuture<'a, Result<String, ProviderError>> {
                futures::future::ready(Err(ProviderError::EmptyResult)).boxed()
            }
        }

        let err = translate_document(
            Path::new("docs/guide.md"),
            "Hello\n",
            "fr",
            &Broken,
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();
        match err {
            DocumentError::Translate { path, source } => {
                assert_eq!(path, Path::new("docs/guide.md"));
                assert_eq!(source, ProviderError::EmptyResult);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_expand_shortcodes() {
        assert_eq!(expand_shortcodes("Ship it :rocket:"), "Ship it \u{1F680}");
        assert_eq!(expand_shortcodes(":+1: done"), "\u{1F44D} done");
        assert_eq!(expand_shortcodes("no :such_emoji_here: code"), "no :such_emoji_here: code");
        assert_eq!(expand_shortcodes("10:30:45"), "10:30:45");
    }

    #[tokio::test]
    async fn test_shortcodes_expanded_outside_code() {
        let output = render("Ship it :rocket:\n\n```\n:rocket:\n```\n\nDONE :tada:\n", false).await;
        assert!(output.contains("SHIP IT \u{1F680}!"), "{output}");
        assert!(output.contains("\n:rocket:\n"), "{output}");
        assert!(output.contains("DONE \u{1F389}"), "{output}");
        assert!(!output.contains("DONE \u{1F389}!"), "{output}");
    }

    proptest! {
        #[test]
        fn prop_split_whitespace_reassembles(text in "\\PC{0,40}") {
            let (pre, core, post) = split_whitespace(&text);
            prop_assert_eq!(format!("{}{}{}", pre, core, post), text.clone());
            prop_assert_eq!(core, core.trim());
            prop_assert!(pre.trim().is_empty());
            prop_assert!(post.trim().is_empty());
        }
    }
}
