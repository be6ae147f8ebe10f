use log::{debug, error};
use serde::Deserialize;

use crate::{
    isbn::check_isbn,
    metadata::{self, Metadata, DOUBAN_SCHEME, ISBN_SCHEME},
};

/// Substring of a cover URL that marks Douban's stand-in artwork.
const NO_COVER_MARKER: &str = "book-default";

/// Response body of the ISBN endpoint: a single entry or a batch.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(untagged)]
pub(crate) enum ApiResponse {
    Many(Vec<BookEntry>),
    One(Box<BookEntry>),
}

impl ApiResponse {
    pub(crate) fn into_entries(self) -> Vec<BookEntry> {
        match self {
            Self::Many(entries) => entries,
            Self::One(entry) => vec![*entry],
        }
    }
}

/// One book entry as served by the API.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct BookEntry {
    url: Option<String>,
    title: Option<String>,
    book_intro: Option<String>,
    isbn: Option<IsbnField>,
    cover_url: Option<String>,
    book_info: Option<BookInfo>,
    #[serde(rename = "abstract")]
    summary: Option<String>,
    rating: Option<RatingField>,
}

/// The ISBN field arrives as a single string or a list of candidates.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(untagged)]
enum IsbnField {
    One(String),
    Many(Vec<String>),
}

impl IsbnField {
    fn candidates(&self) -> &[String] {
        match self {
            Self::One(candidate) => std::slice::from_ref(candidate),
            Self::Many(candidates) => candidates,
        }
    }
}

/// Structured book facts keyed by the source's Chinese field names.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
struct BookInfo {
    #[serde(rename = "出版社")]
    publisher: Option<String>,
    #[serde(rename = "出版年")]
    pubdate: Option<String>,
    #[serde(rename = "作者")]
    author: Option<String>,
}

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
struct RatingField {
    value: Option<RatingValue>,
}

/// Rating values arrive as JSON numbers or as decimal strings.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(untagged)]
enum RatingValue {
    Number(f32),
    Text(String),
}

/// Normalizes one API entry into a metadata record.
///
/// Returns `None` when the entry has no title or its detail-page URL
/// yields no numeric Douban id. Field-level failures (publish date,
/// rating) are logged and leave the field defaulted; they never discard
/// the record.
pub(crate) fn to_metadata(entry: BookEntry) -> Option<Metadata> {
    let BookEntry {
        url,
        title,
        book_intro,
        isbn,
        cover_url,
        book_info,
        summary,
        rating,
    } = entry;

    let douban_id = url.as_deref().and_then(digit_run)?;
    let title = title.filter(|t| !t.is_empty())?;

    let mut publisher = None;
    let mut pubdate = None;
    let mut authors = Vec::new();

    if let Some(info) = book_info {
        publisher = info.publisher.filter(|p| !p.is_empty());
        pubdate = info.pubdate;
        authors.extend(
            info.author
                .map(|author| author.trim().to_owned())
                .filter(|author| !author.is_empty()),
        );
    } else if let Some(line) = summary.as_deref() {
        if let Some(facts) = split_fact_line(line) {
            authors = facts.authors;
            publisher = Some(facts.publisher);
            pubdate = Some(facts.pubdate);
        }
    }

    let mut record = Metadata::new(title, authors);
    record
        .identifiers
        .insert(DOUBAN_SCHEME.to_owned(), douban_id);
    record.description = book_intro.filter(|intro| !intro.is_empty());
    record.publisher = publisher;

    let candidates = match &isbn {
        Some(field) => field.candidates(),
        None => &[],
    };
    record.isbns = candidates
        .iter()
        .filter_map(|candidate| check_isbn(candidate))
        .collect();
    if let Some(canonical) = record.isbns.iter().max_by_key(|isbn| isbn.len()) {
        record
            .identifiers
            .insert(ISBN_SCHEME.to_owned(), canonical.clone());
    }

    if let Some(value) = rating.and_then(|r| r.value) {
        record.rating = Some(normalize_rating(value));
    }

    if let Some(raw) = pubdate.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        match metadata::parse_pubdate(raw) {
            Some(date) => record.pubdate = Some(date),
            None => error!("failed to parse publish date {raw:?}"),
        }
    }

    record.cover_url = cover_url.filter(|u| !u.is_empty() && !u.contains(NO_COVER_MARKER));

    Some(record)
}

/// Maps the source's 0–10 scale onto 0–5. An unparseable text value
/// normalizes to zero; the failure is logged, not propagated.
fn normalize_rating(value: RatingValue) -> f32 {
    match value {
        RatingValue::Number(score) => score / 2.0,
        RatingValue::Text(text) => match text.trim().parse::<f32>() {
            Ok(score) => score / 2.0,
            Err(_) => {
                error!("failed to parse rating {text:?}");
                0.0
            }
        },
    }
}

/// First run of ASCII digits in `text`.
fn digit_run(text: &str) -> Option<String> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    Some(digits)
}

struct FactLine {
    authors: Vec<String>,
    publisher: String,
    pubdate: String,
}

/// Positional extraction from a "/"-delimited fact line.
///
/// The last field is the publish year, the second-to-last the publisher,
/// and everything before them author names. Lines with fewer than three
/// fields don't pin those positions down and are not trusted.
fn split_fact_line(line: &str) -> Option<FactLine> {
    let fields: Vec<&str> = line
        .split('/')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() < 3 {
        debug!("fact line has too few fields to extract from: {line:?}");
        return None;
    }
    let pubdate = fields[fields.len() - 1].to_owned();
    let publisher = fields[fields.len() - 2].to_owned();
    let authors = fields[..fields.len() - 2]
        .iter()
        .map(|&field| field.to_owned())
        .collect();
    Some(FactLine {
        authors,
        publisher,
        pubdate,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{to_metadata, ApiResponse, BookEntry};

    const BOOK_JSON: &str = include_str!("../../tests/data/feelyou_book.json");

    fn entry(json: &str) -> BookEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn full_entry_normalizes_to_record() {
        let record = to_metadata(entry(BOOK_JSON)).unwrap();

        assert_eq!("人间失格", record.title);
        assert_eq!(vec!["太宰治".to_owned()], record.authors);
        assert_eq!(Some("作家出版社"), record.publisher.as_deref());
        assert_eq!(NaiveDate::from_ymd_opt(2015, 8, 15), record.pubdate);
        assert_eq!(Some("26387962"), record.douban_id());
        assert_eq!(Some("9787506380263"), record.isbn());
        assert_eq!(vec!["9787506380263".to_owned()], record.isbns);
        assert!(record.description.is_some());
        assert_eq!(
            Some("https://img9.doubanio.com/view/subject/l/public/s29651121.jpg"),
            record.cover_url.as_deref()
        );
        assert!(matches!(record.rating, Some(r) if (r - 4.15).abs() < f32::EPSILON));
    }

    #[test]
    fn entry_without_title_is_discarded() {
        let json = r#"{"url": "https://book.douban.com/subject/123/"}"#;
        assert!(to_metadata(entry(json)).is_none());
    }

    #[test]
    fn entry_without_numeric_id_is_discarded() {
        let json = r#"{"url": "https://book.douban.com/subject/unknown/", "title": "t"}"#;
        assert!(to_metadata(entry(json)).is_none());

        let json = r#"{"title": "t"}"#;
        assert!(to_metadata(entry(json)).is_none());
    }

    #[test]
    fn longest_valid_isbn_wins() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "isbn": ["0735619670", "9787506380263"]
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(Some("9787506380263"), record.isbn());
        assert_eq!(
            vec!["0735619670".to_owned(), "9787506380263".to_owned()],
            record.isbns
        );
    }

    #[test]
    fn invalid_isbn_candidates_are_dropped() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "isbn": ["12345", "9787506380263"]
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(vec!["9787506380263".to_owned()], record.isbns);
    }

    #[test]
    fn single_isbn_string_is_accepted() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "isbn": "9787506380263"
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(Some("9787506380263"), record.isbn());
    }

    #[test]
    fn placeholder_cover_is_treated_as_absent() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "cover_url": "https://img9.doubanio.com/view/subject/l/public/book-default-lpic.jpg"
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(None, record.cover_url);
    }

    #[test]
    fn rating_of_eight_normalizes_to_four() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "rating": {"value": 8}
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert!(matches!(record.rating, Some(r) if (r - 4.0).abs() < f32::EPSILON));
    }

    #[test]
    fn rating_as_text_is_parsed() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "rating": {"value": "8"}
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert!(matches!(record.rating, Some(r) if (r - 4.0).abs() < f32::EPSILON));
    }

    #[test]
    fn unparseable_rating_normalizes_to_zero() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "rating": {"value": "n/a"}
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert!(matches!(record.rating, Some(r) if r.abs() < f32::EPSILON));
    }

    #[test]
    fn absent_rating_stays_absent() {
        let json = r#"{"url": "https://book.douban.com/subject/123/", "title": "t"}"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(None, record.rating);
    }

    #[test]
    fn unparseable_pubdate_is_left_absent() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "book_info": {"出版年": "unknown"}
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(None, record.pubdate);
    }

    #[test]
    fn fact_line_fallback_extracts_trailing_fields() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "abstract": "太宰治 / 烨伊 / 武汉出版社 / 2011-6"
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(vec!["太宰治".to_owned(), "烨伊".to_owned()], record.authors);
        assert_eq!(Some("武汉出版社"), record.publisher.as_deref());
        assert_eq!(NaiveDate::from_ymd_opt(2011, 6, 15), record.pubdate);
    }

    #[test]
    fn short_fact_line_is_not_trusted() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "abstract": "太宰治 / 2011"
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(vec!["Unknown".to_owned()], record.authors);
        assert_eq!(None, record.publisher);
        assert_eq!(None, record.pubdate);
    }

    #[test]
    fn structured_facts_win_over_fact_line() {
        let json = r#"{
            "url": "https://book.douban.com/subject/123/",
            "title": "t",
            "book_info": {"出版社": "作家出版社", "作者": "太宰治"},
            "abstract": "someone else / elsewhere / 1999"
        }"#;
        let record = to_metadata(entry(json)).unwrap();

        assert_eq!(vec!["太宰治".to_owned()], record.authors);
        assert_eq!(Some("作家出版社"), record.publisher.as_deref());
    }

    #[test]
    fn response_body_may_be_one_entry_or_many() {
        let one: ApiResponse = serde_json::from_str(BOOK_JSON).unwrap();
        assert_eq!(1, one.into_entries().len());

        let many: ApiResponse =
            serde_json::from_str(&format!("[{BOOK_JSON}, {BOOK_JSON}]")).unwrap();
        assert_eq!(2, many.into_entries().len());
    }

    #[test]
    fn empty_array_response_has_no_entries() {
        let response: ApiResponse = serde_json::from_str("[]").unwrap();
        assert!(response.into_entries().is_empty());
    }
}
