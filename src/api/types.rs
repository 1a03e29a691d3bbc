use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::catalog::{BookInput, MemberInput};
use crate::application::loan::LoanRecord;
use crate::domain::{Book, Member};

/// レスポンスのタイムスタンプ表記（UTC、固定フォーマット）
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// 貸出リクエスト（POST /loans/borrow）
#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    pub member_id: Uuid,
    pub book_id: Uuid,
}

/// 返却リクエスト（POST /loans/return）
#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    pub loan_id: Uuid,
}

/// 貸出レスポンス
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub borrowed_at: String,
    pub due_date: String,
    pub returned_at: Option<String>,
}

impl From<LoanRecord> for LoanResponse {
    fn from(record: LoanRecord) -> Self {
        Self {
            id: record.loan_id.value(),
            book_id: record.book_id.value(),
            member_id: record.member_id.value(),
            borrowed_at: format_timestamp(record.borrowed_at),
            due_date: format_timestamp(record.due_date),
            returned_at: record.returned_at.map(format_timestamp),
        }
    }
}

/// 書籍の登録・更新リクエスト
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl BookRequest {
    pub fn into_input(self) -> BookInput {
        BookInput {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            total_copies: self.total_copies,
            available_copies: self.available_copies,
        }
    }
}

/// 書籍レスポンス
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.book_id.value(),
            title: book.title,
            author: book.author,
            isbn: book.isbn.value().to_string(),
            total_copies: book.total_copies,
            available_copies: book.available_copies,
        }
    }
}

/// 会員の登録・更新リクエスト
#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

impl MemberRequest {
    pub fn into_input(self) -> MemberInput {
        MemberInput {
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
        }
    }
}

/// 会員レスポンス
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.member_id.value(),
            name: member.name,
            email: member.email,
            phone_number: member.phone_number,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
