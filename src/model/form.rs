//! Book create/edit form state, validation and request building

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};

use super::book::{manual_book_id, Author, BookCreate, BookDetail, BookUpdate};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Isbn,
    Author,
    Price,
    Quantity,
    PageCount,
    Dimensions,
    Weight,
    Description,
    Introduction,
    TableOfContents,
    PublisherImage,
    CoverImage,
}

impl FormField {
    pub const ALL: [FormField; 13] = [
        FormField::Title,
        FormField::Isbn,
        FormField::Author,
        FormField::Price,
        FormField::Quantity,
        FormField::PageCount,
        FormField::Dimensions,
        FormField::Weight,
        FormField::Description,
        FormField::Introduction,
        FormField::TableOfContents,
        FormField::PublisherImage,
        FormField::CoverImage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Isbn => "ISBN",
            Self::Author => "Author",
            Self::Price => "Price",
            Self::Quantity => "Quantity",
            Self::PageCount => "Pages",
            Self::Dimensions => "Dimensions",
            Self::Weight => "Weight",
            Self::Description => "Description",
            Self::Introduction => "Introduction",
            Self::TableOfContents => "Contents",
            Self::PublisherImage => "Publisher image",
            Self::CoverImage => "Cover image",
        }
    }

    /// The author is chosen through the picker, not typed
    pub fn is_editable_text(self) -> bool {
        self != Self::Author
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::PublisherImage | Self::CoverImage)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
pub enum FormMode {
    Create,
    Edit { original: Box<BookDetail> },
}

/// Author search overlay opened from the form's author field
#[derive(Clone, Debug, Default)]
pub struct AuthorPicker {
    pub input: String,
    pub authors: Vec<Author>,
    pub selected: usize,
    pub loading: bool,
}

impl AuthorPicker {
    /// Replace the result list, keeping the first occurrence of each author id
    pub fn set_authors(&mut self, authors: Vec<Author>) {
        let mut seen = HashSet::new();
        self.authors = authors
            .into_iter()
            .filter(|a| seen.insert(a.id.clone()))
            .collect();
        self.selected = 0;
        self.loading = false;
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.authors.len() {
            self.selected += 1;
        }
    }

    pub fn selected_author(&self) -> Option<&Author> {
        self.authors.get(self.selected)
    }
}

#[derive(Clone, Debug)]
pub struct BookForm {
    pub mode: FormMode,
    values: Vec<String>,
    pub selected: usize,
    pub author: Option<Author>,
    pub author_picker: Option<AuthorPicker>,
    pub submitting: bool,
    pub validation_error: Option<String>,
}

impl BookForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            values: vec![String::new(); FormField::ALL.len()],
            selected: 0,
            author: None,
            author_picker: None,
            submitting: false,
            validation_error: None,
        }
    }

    pub fn edit(book: BookDetail) -> Self {
        let mut form = Self::create();
        form.set_value(FormField::Title, book.title.clone());
        form.set_value(FormField::Isbn, book.isbn.clone());
        form.set_value(FormField::Price, book.price.map(format_number).unwrap_or_default());
        form.set_value(FormField::Quantity, book.quantity.to_string());
        form.set_value(FormField::PageCount, book.page_count.map(|n| n.to_string()).unwrap_or_default());
        form.set_value(FormField::Dimensions, book.dimensions.clone().unwrap_or_default());
        form.set_value(FormField::Weight, book.weight.map(format_number).unwrap_or_default());
        form.set_value(FormField::Description, book.description.clone().unwrap_or_default());
        form.set_value(FormField::Introduction, book.introduction.clone().unwrap_or_default());
        form.set_value(FormField::TableOfContents, book.table_of_contents.clone().unwrap_or_default());
        form.set_value(FormField::PublisherImage, book.publisher_image.clone().unwrap_or_default());
        form.set_value(FormField::CoverImage, book.cover_image.clone());
        form.author = book.author.clone();
        form.mode = FormMode::Edit { original: Box::new(book) };
        form
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    /// Management id of the book being edited
    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Edit { original } => Some(&original.book_manage_id),
            FormMode::Create => None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.is_edit() { " Edit Book " } else { " New Book " }
    }

    pub fn value(&self, field: FormField) -> &str {
        &self.values[field.index()]
    }

    pub fn set_value(&mut self, field: FormField, value: String) {
        self.values[field.index()] = value;
    }

    pub fn selected_field(&self) -> FormField {
        FormField::ALL[self.selected.min(FormField::ALL.len() - 1)]
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % FormField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        self.selected = (self.selected + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    /// The cover image can only be replaced on an existing book
    pub fn accepts(&self, field: FormField) -> bool {
        field.is_editable_text() && (field != FormField::CoverImage || self.is_edit())
    }

    pub fn insert_char(&mut self, c: char) {
        let field = self.selected_field();
        if self.accepts(field) {
            self.values[field.index()].push(c);
            self.validation_error = None;
        }
    }

    pub fn backspace(&mut self) {
        let field = self.selected_field();
        if self.accepts(field) {
            self.values[field.index()].pop();
        }
    }

    pub fn set_author(&mut self, author: Author) {
        self.author = Some(author);
        self.author_picker = None;
        self.validation_error = None;
    }

    pub fn author_display(&self) -> &str {
        self.author.as_ref().map(|a| a.name.as_str()).unwrap_or("(Enter to choose)")
    }

    /// Image fields that hold a local file path rather than a storage reference
    pub fn pending_uploads(&self) -> Vec<(FormField, PathBuf)> {
        [FormField::PublisherImage, FormField::CoverImage]
            .into_iter()
            .filter(|field| self.accepts(*field))
            .filter_map(|field| {
                let value = self.value(field).trim();
                if value.is_empty() || is_storage_reference(value) {
                    None
                } else {
                    Some((field, PathBuf::from(value)))
                }
            })
            .collect()
    }

    pub fn build_create(&self) -> Result<BookCreate> {
        let title = self.text(FormField::Title);
        let isbn = self.text(FormField::Isbn);
        let Some(title) = title else { bail!("Title is required") };
        let Some(isbn) = isbn else { bail!("ISBN is required") };
        let Some(author) = &self.author else { bail!("Author is required") };

        Ok(BookCreate {
            book_manage_id: manual_book_id(&isbn),
            title,
            isbn,
            author_id: author.id.clone(),
            quantity: self.integer(FormField::Quantity)?.unwrap_or(0),
            description: self.text(FormField::Description),
            price: self.decimal(FormField::Price)?,
            page_count: self.integer(FormField::PageCount)?,
            dimensions: self.text(FormField::Dimensions),
            weight: self.decimal(FormField::Weight)?,
            table_of_contents: self.text(FormField::TableOfContents),
            introduction: self.text(FormField::Introduction),
            publisher_image: self.text(FormField::PublisherImage),
        })
    }

    /// Build an update carrying only the fields that differ from the loaded book
    pub fn build_update(&self) -> Result<BookUpdate> {
        let FormMode::Edit { original } = &self.mode else {
            bail!("Form is not editing an existing book");
        };

        let title = self.text(FormField::Title);
        let isbn = self.text(FormField::Isbn);
        if title.is_none() {
            bail!("Title is required");
        }
        if isbn.is_none() {
            bail!("ISBN is required");
        }

        let price = self.decimal(FormField::Price)?;
        let quantity = self.integer(FormField::Quantity)?;
        let page_count = self.integer(FormField::PageCount)?;
        let weight = self.decimal(FormField::Weight)?;

        Ok(BookUpdate {
            title: changed_text(title, Some(original.title.as_str())),
            isbn: changed_text(isbn, Some(original.isbn.as_str())),
            author_id: self
                .author
                .as_ref()
                .map(|a| a.id.clone())
                .filter(|id| *id != original.author_id),
            description: changed_text(self.text(FormField::Description), original.description.as_deref()),
            price: price.filter(|p| Some(*p) != original.price),
            quantity: quantity.filter(|q| *q != original.quantity),
            page_count: page_count.filter(|n| Some(*n) != original.page_count),
            dimensions: changed_text(self.text(FormField::Dimensions), original.dimensions.as_deref()),
            weight: weight.filter(|w| Some(*w) != original.weight),
            table_of_contents: changed_text(
                self.text(FormField::TableOfContents),
                original.table_of_contents.as_deref(),
            ),
            introduction: changed_text(self.text(FormField::Introduction), original.introduction.as_deref()),
            publisher_image: changed_text(
                self.text(FormField::PublisherImage),
                original.publisher_image.as_deref(),
            ),
            cover_image: changed_text(self.text(FormField::CoverImage), Some(original.cover_image.as_str())),
        })
    }

    fn text(&self, field: FormField) -> Option<String> {
        let value = self.value(field).trim();
        if value.is_empty() { None } else { Some(value.to_string()) }
    }

    fn decimal(&self, field: FormField) -> Result<Option<f64>> {
        let Some(raw) = self.text(field) else { return Ok(None) };
        match raw.replace(',', "").parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
            _ => bail!("{} must be a non-negative number", field.label()),
        }
    }

    fn integer(&self, field: FormField) -> Result<Option<i64>> {
        let Some(raw) = self.text(field) else { return Ok(None) };
        match raw.replace(',', "").parse::<i64>() {
            Ok(v) if v >= 0 => Ok(Some(v)),
            _ => bail!("{} must be a whole number", field.label()),
        }
    }
}

/// Uploaded images come back as URLs; anything else is treated as a local path
pub fn is_storage_reference(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// A cleared text field is sent as an empty string so the server clears it too
fn changed_text(new: Option<String>, original: Option<&str>) -> Option<String> {
    let original = original.unwrap_or("");
    let new = new.unwrap_or_default();
    if new == original { None } else { Some(new) }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn author(id: &str, name: &str) -> Author {
        Author {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created: String::new(),
            modified: String::new(),
        }
    }

    fn detail() -> BookDetail {
        BookDetail {
            book_manage_id: "Custom_123".into(),
            id: "b1".into(),
            title: "Dune".into(),
            isbn: "123".into(),
            description: Some("Spice".into()),
            price: Some(12000.0),
            quantity: 2,
            page_count: Some(600),
            dimensions: None,
            weight: None,
            table_of_contents: None,
            introduction: None,
            publisher_image: Some("http://localhost:9000/lms/media/p.jpg".into()),
            cover_image: String::new(),
            author_id: "a1".into(),
            author: Some(author("a1", "Frank Herbert")),
            created: String::new(),
            modified: String::new(),
        }
    }

    fn type_into(form: &mut BookForm, field: FormField, text: &str) {
        form.selected = FormField::ALL.iter().position(|f| *f == field).unwrap();
        text.chars().for_each(|c| form.insert_char(c));
    }

    #[rstest]
    fn create_requires_title_isbn_and_author() {
        let mut form = BookForm::create();
        assert_eq!(form.build_create().unwrap_err().to_string(), "Title is required");

        type_into(&mut form, FormField::Title, "Dune");
        assert_eq!(form.build_create().unwrap_err().to_string(), "ISBN is required");

        type_into(&mut form, FormField::Isbn, "9788937460449");
        assert_eq!(form.build_create().unwrap_err().to_string(), "Author is required");

        form.set_author(author("a1", "Frank Herbert"));
        let create = form.build_create().unwrap();
        assert_eq!(create.book_manage_id, "Custom_9788937460449");
        assert_eq!(create.author_id, "a1");
        assert_eq!(create.quantity, 0);
        assert_eq!(create.price, None);
    }

    #[rstest]
    #[case(FormField::Price, "12,500", None)]
    #[case(FormField::Price, "abc", Some("Price must be a non-negative number"))]
    #[case(FormField::Quantity, "-1", Some("Quantity must be a whole number"))]
    #[case(FormField::PageCount, "3.5", Some("Pages must be a whole number"))]
    #[case(FormField::Weight, "0.45", None)]
    fn numeric_fields_are_validated(#[case] field: FormField, #[case] input: &str, #[case] error: Option<&str>) {
        let mut form = BookForm::create();
        type_into(&mut form, FormField::Title, "Dune");
        type_into(&mut form, FormField::Isbn, "1");
        form.set_author(author("a1", "Frank Herbert"));
        type_into(&mut form, field, input);

        match error {
            Some(msg) => assert_eq!(form.build_create().unwrap_err().to_string(), msg),
            None => assert!(form.build_create().is_ok()),
        }
    }

    #[rstest]
    fn author_field_is_not_typed_into() {
        let mut form = BookForm::create();
        type_into(&mut form, FormField::Author, "xyz");
        assert_eq!(form.value(FormField::Author), "");
        assert_eq!(form.author_display(), "(Enter to choose)");
    }

    #[rstest]
    fn unchanged_edit_produces_empty_update() {
        let form = BookForm::edit(detail());
        assert_eq!(form.value(FormField::Price), "12000");
        assert_eq!(form.editing_id(), Some("Custom_123"));
        assert!(form.build_update().unwrap().is_empty());
    }

    #[rstest]
    fn edit_sends_only_changed_fields() {
        let mut form = BookForm::edit(detail());
        form.set_value(FormField::Quantity, "5".into());
        form.set_value(FormField::Description, String::new());
        form.set_author(author("a2", "Brian Herbert"));

        let update = form.build_update().unwrap();
        assert_eq!(update.quantity, Some(5));
        assert_eq!(update.description.as_deref(), Some(""));
        assert_eq!(update.author_id.as_deref(), Some("a2"));
        assert_eq!(update.title, None);
        assert_eq!(update.price, None);
    }

    #[rstest]
    fn local_image_paths_are_pending_uploads() {
        let mut form = BookForm::edit(detail());
        form.set_value(FormField::CoverImage, "/tmp/cover.png".into());

        let uploads = form.pending_uploads();
        assert_eq!(uploads, vec![(FormField::CoverImage, PathBuf::from("/tmp/cover.png"))]);
    }

    #[rstest]
    fn create_form_has_no_cover_upload() {
        let mut form = BookForm::create();
        type_into(&mut form, FormField::CoverImage, "/tmp/cover.png");
        assert_eq!(form.value(FormField::CoverImage), "");

        form.set_value(FormField::CoverImage, "/tmp/cover.png".into());
        form.set_value(FormField::PublisherImage, "/tmp/publisher.png".into());
        assert_eq!(
            form.pending_uploads(),
            vec![(FormField::PublisherImage, PathBuf::from("/tmp/publisher.png"))]
        );
    }

    #[rstest]
    fn field_navigation_wraps() {
        let mut form = BookForm::create();
        form.prev_field();
        assert_eq!(form.selected_field(), FormField::CoverImage);
        form.next_field();
        assert_eq!(form.selected_field(), FormField::Title);
    }

    #[rstest]
    fn picker_deduplicates_authors() {
        let mut picker = AuthorPicker {
            loading: true,
            ..Default::default()
        };
        picker.set_authors(vec![
            author("a1", "Frank Herbert"),
            author("a2", "Brian Herbert"),
            author("a1", "Frank Herbert"),
        ]);

        assert_eq!(picker.authors.len(), 2);
        assert!(!picker.loading);
        picker.move_down();
        picker.move_down();
        assert_eq!(picker.selected_author().unwrap().id, "a2");
        picker.move_up();
        assert_eq!(picker.selected_author().unwrap().id, "a1");
    }
}
