//! Book Service - create, edit and delete pages
//!
//! Every write goes through the shared form controller; this module only
//! supplies the fields, copy, cache keys and destinations of each page.

use chrono::Utc;
use serde_json::Value;

use crate::cache::ResourceState;
use crate::domain::{ApiError, ApiErrorKind};
use crate::form::{
    Completed, ErrorNotices, FieldAccess, Form, FormController, FormValues, Mutation,
    SubmitOutcome, Validators, is_datetime, is_not_empty, min_integer,
};
use crate::models::book::DEFAULT_GENRE_ID;
use crate::models::{Book, BookCreated, BookInput, Genre};
use crate::notify::{Notification, Severity};
use crate::state::AppState;

pub const BOOKS_KEY: &str = "/books";
pub const GENRES_KEY: &str = "/genres";
pub const BOOK_LIST_PATH: &str = "/books";

pub fn book_key(id: i64) -> String {
    format!("/books/{}", id)
}

const NOT_FOUND_TITLE: &str = "ไม่พบข้อมูลหนังสือ";

/// Build the write payload. `None` when the date or genre id is unreadable.
fn book_input(values: &FormValues) -> Option<BookInput> {
    Some(BookInput {
        title: values.text("title"),
        author: values.text("author"),
        published_at: values.datetime("publishedAt")?,
        description: values.text("description"),
        summary: values.text("summary"),
        genre_id: values.integer("genreId")?,
    })
}

// Unreachable once the validators have passed
fn incomplete() -> ApiError {
    ApiError::Validation("book form has no readable date or genre".to_string())
}

pub struct BookService {
    state: AppState,
    form: FormController,
}

impl BookService {
    pub fn new(state: AppState) -> Self {
        let form = state.form_controller();
        Self { state, form }
    }

    pub fn controller(&self) -> &FormController {
        &self.form
    }

    pub async fn get(&self, id: i64) -> ResourceState<Book> {
        self.state.cache.use_resource(Some(&book_key(id))).await
    }

    pub async fn genres(&self) -> ResourceState<Vec<Genre>> {
        self.state.cache.use_resource(Some(GENRES_KEY)).await
    }

    pub fn blank_form() -> Form {
        let mut form = Form::new();
        form.set("title", "")
            .set("author", "")
            .set("publishedAt", Utc::now())
            .set("description", "")
            .set("summary", "")
            .set("genreId", DEFAULT_GENRE_ID);
        form
    }

    /// Seed the edit form from a fetched book
    pub fn edit_form(book: &Book) -> Form {
        let input = BookInput::from(book);
        let mut form = Form::new();
        form.set("title", input.title)
            .set("author", input.author)
            .set("publishedAt", input.published_at)
            .set("description", input.description)
            .set("summary", input.summary)
            .set("genreId", input.genre_id);
        form
    }

    pub fn validators() -> Validators {
        Validators::new()
            .field("title", is_not_empty("กรุณาระบุชื่อหนังสือ"))
            .field("author", is_not_empty("กรุณาระบุชื่อผู้แต่ง"))
            .field("publishedAt", is_datetime("กรุณาระบุวันที่พิมพ์หนังสือ"))
            .field("description", is_not_empty("กรุณาระบุรายละเอียดหนังสือ"))
            .field("summary", is_not_empty("กรุณาระบุเรื่องย่อหนังสือ"))
            .field("genreId", min_integer(1, "กรุณาเลือกหมวดหมู่หนังสือ"))
    }

    pub async fn create(&self, values: &FormValues) -> SubmitOutcome {
        let client = self.state.client().clone();
        let body = book_input(values);

        let mutation = Mutation::new(
            move || async move {
                let body = body.ok_or_else(incomplete)?;
                let created: BookCreated = client.post(BOOKS_KEY, &body).await?;
                Ok::<_, ApiError>(Completed::navigate(book_key(created.book.id)))
            },
            Notification::success(
                "เพิ่มข้อมูลหนังสือสำเร็จ",
                "ข้อมูลหนังสือได้รับการเพิ่มเรียบร้อยแล้ว",
            ),
        )
        .invalidates(BOOKS_KEY);

        self.form
            .submit(values, &Self::validators(), mutation)
            .await
    }

    pub async fn update(&self, id: i64, values: &FormValues) -> SubmitOutcome {
        let client = self.state.client().clone();
        let body = book_input(values);
        let path = book_key(id);

        let mutation = Mutation::new(
            move || async move {
                let body = body.ok_or_else(incomplete)?;
                // PATCH replies are not relied on
                let _: Value = client.patch(&path, &body).await?;
                Ok::<_, ApiError>(Completed::navigate(path))
            },
            Notification::success(
                "แก้ไขข้อมูลหนังสือสำเร็จ",
                "ข้อมูลหนังสือได้รับการแก้ไขเรียบร้อยแล้ว",
            ),
        )
        .invalidates(book_key(id))
        .invalidates(BOOKS_KEY)
        .errors(ErrorNotices::default().with(
            ApiErrorKind::NotFound,
            NOT_FOUND_TITLE,
            "ไม่พบข้อมูลหนังสือที่ต้องการแก้ไข",
        ));

        self.form
            .submit(values, &Self::validators(), mutation)
            .await
    }

    /// Confirmation is the caller's job; this submits straight away.
    pub async fn delete(&self, id: i64) -> SubmitOutcome {
        let client = self.state.client().clone();
        let path = book_key(id);

        let mutation = Mutation::new(
            move || async move {
                let _: Value = client.delete(&path).await?;
                Ok::<_, ApiError>(Completed::navigate(BOOK_LIST_PATH))
            },
            Notification {
                title: "ลบหนังสือสำเร็จ".to_string(),
                message: "ลบหนังสือเล่มนี้ออกจากระบบเรียบร้อยแล้ว".to_string(),
                severity: Severity::Info,
            },
        )
        .invalidates(book_key(id))
        .invalidates(BOOKS_KEY)
        .errors(ErrorNotices::default().with(
            ApiErrorKind::NotFound,
            NOT_FOUND_TITLE,
            "ไม่พบข้อมูลหนังสือที่ต้องการลบ",
        ));

        // No fields to check
        self.form
            .submit(&FormValues::new(), &Validators::new(), mutation)
            .await
    }
}
