use std::{
    fmt::{self, Display, Formatter},
    io::{self, Read, Seek, SeekFrom},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("a generic IO error")]
    Io(#[from] io::Error),

    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedCharacter { ch: char, line: usize },

    #[error("line {line}: error parsing number `{text}`")]
    NumberParseError { text: String, line: usize },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: string is not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An identifier: a keyword, or an unquoted file name.
    Identifier(String),

    /// A string. Any text that is surrounded by quotes. Supports quote escaping.
    String(String),

    /// A number. Decimals and exponent optional.
    Number(f64),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(ident) => write!(f, "{}", ident),
            Self::String(str) => write!(f, "\"{}\"", str),
            Self::Number(num) => write!(f, "{}", num),
        }
    }
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub struct Tokenizer<R: Read + Seek> {
    reader: R,
    line: usize,
}

impl<R: Read + Seek> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Tokenizer { reader, line: 1 }
    }

    /// Tokenize from the reader, converting to a `Result<Vec<Spanned>, TokenizeError>`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, TokenizeError> {
        let mut tokens = vec![];

        while let Some(c) = self.peek_next()? {
            let line = self.line;
            let token = match c {
                '\n' => {
                    self.line += 1;
                    self.skip()?;
                    continue;
                }

                // whitespace: ignore
                _ if c.is_whitespace() => {
                    self.skip()?;
                    continue;
                }

                // a hash: comment until the end of the line
                '#' => {
                    self.read_while(|c| c != '\n')?;
                    continue;
                }

                // alphabetical characters: identifier
                'A'..='Z' | 'a'..='z' | '_' => Token::Identifier(self.read_identifier()?),

                // a quote: string
                '"' => Token::String(self.read_string()?),

                // a number: number
                '0'..='9' | '.' | '-' | '+' => Token::Number(self.read_number()?),

                ch => return Err(TokenizeError::UnexpectedCharacter { ch, line }),
            };

            tokens.push(Spanned { token, line });
        }

        Ok(tokens)
    }

    /// Read an identifier. Besides alphanumerics it may hold the characters
    /// of a relative file name.
    fn read_identifier(&mut self) -> Result<String, TokenizeError> {
        Ok(self
            .read_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/' | '\\'))?
            .into_iter()
            .collect())
    }

    /// Read a string, which is two quotations surrounding any amount of text.
    fn read_string(&mut self) -> Result<String, TokenizeError> {
        let line = self.line;

        // skip the initial quotation
        self.skip()?;

        let mut escape = false;
        let mut bytes = vec![];

        loop {
            let b = match self.next_byte()? {
                Some(b) => b,
                None => return Err(TokenizeError::UnterminatedString { line }),
            };

            match b {
                b'"' if !escape => break,
                b'\\' if !escape => escape = true,
                b'n' if escape => {
                    bytes.push(b'\n');
                    escape = false;
                }
                b => {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    bytes.push(b);
                    escape = false;
                }
            }
        }

        String::from_utf8(bytes).map_err(|_| TokenizeError::InvalidUtf8 { line })
    }

    /// Read a number, which is an f64.
    fn read_number(&mut self) -> Result<f64, TokenizeError> {
        let mut text = String::new();

        if let Some(sign @ ('-' | '+')) = self.peek_next()? {
            self.skip()?;
            text.push(sign);
        }

        while let Some(c) = self.next()? {
            let exponent_sign = matches!(c, '-' | '+') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') || exponent_sign {
                text.push(c);
            } else {
                self.back()?;
                break;
            }
        }

        text.parse().map_err(|_| TokenizeError::NumberParseError {
            text,
            line: self.line,
        })
    }

    /// Read the next raw byte in the reader, or `None` at the end.
    fn next_byte(&mut self) -> Result<Option<u8>, io::Error> {
        let mut byte = [0u8];
        match self.reader.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Read the next byte as a character. Only meaningful outside strings,
    /// where the grammar is ASCII.
    fn next(&mut self) -> Result<Option<char>, io::Error> {
        Ok(self.next_byte()?.map(char::from))
    }

    /// Skips the next character in the reader.
    fn skip(&mut self) -> Result<(), io::Error> {
        self.reader.seek(SeekFrom::Current(1)).map(|_| ())
    }

    /// Goes back to the last character in the reader.
    fn back(&mut self) -> Result<(), io::Error> {
        self.reader.seek(SeekFrom::Current(-1)).map(|_| ())
    }

    /// Peeks ahead at the next character in the reader. This works by reading and then seeking back one on success.
    fn peek_next(&mut self) -> Result<Option<char>, io::Error> {
        let c = self.next()?;
        if c.is_some() {
            self.back()?;
        }
        Ok(c)
    }

    /// Reads bytes until the predicate returns false.
    fn read_while<F>(&mut self, f: F) -> Result<Vec<char>, io::Error>
    where
        F: Fn(char) -> bool,
    {
        let mut v = vec![];

        while let Some(c) = self.next()? {
            if f(c) {
                v.push(c);
            } else {
                // otherwise seek back one and break out of the loop
                self.back()?;
                break;
            }
        }

        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        Tokenizer::new(Cursor::new(src))
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("1 -2.5 .5 3. +4 1e3 -2.5E-1"),
            vec![
                Token::Number(1.),
                Token::Number(-2.5),
                Token::Number(0.5),
                Token::Number(3.),
                Token::Number(4.),
                Token::Number(1000.),
                Token::Number(-0.25),
            ]
        );
    }

    #[test]
    fn comments_and_lines() {
        let spanned = Tokenizer::new(Cursor::new("# camera\n0 0 5 # trailing\n\nsphere"))
            .tokenize()
            .unwrap();

        assert_eq!(spanned.len(), 4);
        assert_eq!(spanned[0], Spanned { token: Token::Number(0.), line: 2 });
        assert_eq!(
            spanned[3],
            Spanned {
                token: Token::Identifier("sphere".into()),
                line: 4
            }
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(
            tokens("texmap wood_01.png \"my textures/a b.ppm\""),
            vec![
                Token::Identifier("texmap".into()),
                Token::Identifier("wood_01.png".into()),
                Token::String("my textures/a b.ppm".into()),
            ]
        );
    }

    #[test]
    fn strings_decode_utf8() {
        assert_eq!(
            tokens("\"textures/café ü.png\""),
            vec![Token::String("textures/café ü.png".into())]
        );
        assert!(matches!(
            Tokenizer::new(Cursor::new(&b"\"\xff\xfe\""[..])).tokenize(),
            Err(TokenizeError::InvalidUtf8 { line: 1 })
        ));
    }

    #[test]
    fn errors() {
        assert!(matches!(
            Tokenizer::new(Cursor::new("1 2\n@")).tokenize(),
            Err(TokenizeError::UnexpectedCharacter { ch: '@', line: 2 })
        ));
        assert!(matches!(
            Tokenizer::new(Cursor::new("1..2")).tokenize(),
            Err(TokenizeError::NumberParseError { .. })
        ));
        assert!(matches!(
            Tokenizer::new(Cursor::new("\"open")).tokenize(),
            Err(TokenizeError::UnterminatedString { line: 1 })
        ));
    }
}
