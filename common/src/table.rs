//! 区切り文字付きテキスト（CSV）の読み込み
//!
//! ヘッダー行 + データ行。空行はスキップし、ダブルクォートに対応する。

/// 読み込んだ表データ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// セミコロン区切りの文字列から読み込み
    pub fn parse_semicolon(content: &str) -> Self {
        Self::parse(content, ';')
    }

    /// 任意の区切り文字で読み込み
    pub fn parse(content: &str, delimiter: char) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut records = parse_records(content, delimiter).into_iter();

        let Some(headers) = records.next() else {
            return Self::default();
        };
        Self {
            headers,
            rows: records.collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 全体をレコードに分割
///
/// クォートの状態は行をまたいで保持するので、クォート内の改行はフィールドの一部になる。
/// クォート内の `""` は `"` 1文字。空白だけの行は捨てる。
fn parse_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c != '"' {
                field.push(c);
            } else if chars.peek() == Some(&'"') {
                chars.next();
                field.push('"');
            } else {
                in_quotes = false;
            }
            continue;
        }

        match c {
            // フィールド先頭のクォートのみ特別扱い
            '"' if !quoted && field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                quoted = true;
            }
            '\r' if matches!(chars.peek(), Some(&'\n') | None) => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                quoted = false;
                push_record(&mut records, std::mem::take(&mut record));
            }
            c if c == delimiter => {
                record.push(std::mem::take(&mut field));
                quoted = false;
            }
            c => field.push(c),
        }
    }

    if quoted || !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}
