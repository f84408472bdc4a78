//! EnergyPlus input file (IDF) reader and writer.
//!
//! An IDF is a sequence of objects `Class, field, ..., field;` where `!`
//! starts a comment running to the end of the line. Objects are kept in file
//! order. Comments and the original layout are not preserved on write.

use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// One IDF object: class name and its fields, without the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdfObject {
    pub class: String,
    pub fields: Vec<String>,
}

impl IdfObject {
    pub fn new(class: &str, fields: &[&str]) -> Self {
        Self {
            class: class.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Class names compare case-insensitively.
    pub fn is(&self, class: &str) -> bool {
        self.class.eq_ignore_ascii_case(class)
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Sets a field, appending empty fields up to `index` if needed.
    pub fn set_field(&mut self, index: usize, value: &str) {
        if self.fields.len() <= index {
            self.fields.resize(index + 1, String::new());
        }
        self.fields[index] = value.to_string();
    }

    pub fn render(&self) -> String {
        if self.fields.is_empty() {
            return format!("{};\n\n", self.class);
        }
        let mut out = format!("{},\n", self.class);
        let last = self.fields.len() - 1;
        for (i, field) in self.fields.iter().enumerate() {
            let end = if i == last { ';' } else { ',' };
            out.push_str(&format!("    {field}{end}\n"));
        }
        out.push('\n');
        out
    }
}

/// Parsed IDF model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Idf {
    pub objects: Vec<IdfObject>,
}

impl Idf {
    /// Parses IDF text. `source` names the file in errors.
    pub fn parse(text: &str, source: &Path) -> Result<Self, AnalysisError> {
        let parse_err = |line: usize, detail: String| AnalysisError::Parse {
            file: PathBuf::from(source),
            line,
            detail,
        };

        let mut objects = Vec::new();
        let mut pending = String::new();
        let mut start_line = 1;
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let mut rest = raw.split('!').next().unwrap_or_default();
            while let Some((head, tail)) = rest.split_once(';') {
                if pending.trim().is_empty() {
                    start_line = line_no;
                }
                pending.push_str(head);
                let object = parse_object(&pending)
                    .ok_or_else(|| parse_err(start_line, "object without a class name".to_string()))?;
                objects.push(object);
                pending.clear();
                rest = tail;
            }
            if pending.trim().is_empty() && !rest.trim().is_empty() {
                start_line = line_no;
            }
            pending.push_str(rest);
            pending.push('\n');
        }
        if !pending.trim().is_empty() {
            return Err(parse_err(start_line, "object is not terminated by ';'".to_string()));
        }
        Ok(Self { objects })
    }

    pub fn read(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::parse(&text, path)
    }

    pub fn write(&self, path: &Path) -> Result<(), AnalysisError> {
        std::fs::write(path, self.render()).map_err(|e| AnalysisError::io(path, e))
    }

    pub fn render(&self) -> String {
        self.objects.iter().map(IdfObject::render).collect()
    }

    /// Objects of one class, in file order.
    pub fn objects_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a IdfObject> {
        self.objects.iter().filter(move |o| o.is(class))
    }

    pub fn objects_of_mut<'a>(&'a mut self, class: &'a str) -> impl Iterator<Item = &'a mut IdfObject> {
        self.objects.iter_mut().filter(move |o| o.is(class))
    }

    /// Removes every object matching `pred` and returns how many were removed.
    pub fn remove_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&IdfObject) -> bool,
    {
        let before = self.objects.len();
        self.objects.retain(|o| !pred(o));
        before - self.objects.len()
    }

    pub fn push(&mut self, object: IdfObject) {
        self.objects.push(object);
    }
}

fn parse_object(text: &str) -> Option<IdfObject> {
    let mut parts = text.split(',').map(str::trim);
    let class = parts.next().filter(|c| !c.is_empty())?;
    Some(IdfObject {
        class: class.to_string(),
        fields: parts.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "\
! Minimal model
Version,23.1;

Zone,
    LIVING,                  !- Name
    0;                       !- Direction of Relative North {deg}

Output:VariableDictionary,IDF;
Timestep,4;
";

    #[test]
    fn test_parse_objects_and_comments() {
        let idf = Idf::parse(MODEL, Path::new("in.idf")).unwrap();
        assert_eq!(idf.objects.len(), 4);
        assert_eq!(idf.objects[0], IdfObject::new("Version", &["23.1"]));
        assert_eq!(idf.objects[1], IdfObject::new("Zone", &["LIVING", "0"]));
        assert!(idf.objects[2].is("OUTPUT:VARIABLEDICTIONARY"));
        assert_eq!(idf.objects_of("timestep").count(), 1);
    }

    #[test]
    fn test_render_parses_back() {
        let idf = Idf::parse(MODEL, Path::new("in.idf")).unwrap();
        let again = Idf::parse(&idf.render(), Path::new("out.idf")).unwrap();
        assert_eq!(again, idf);
    }

    #[test]
    fn test_set_field_pads_missing_fields() {
        let mut o = IdfObject::new("People", &["P1", "LIVING"]);
        o.set_field(4, "3");
        assert_eq!(o.fields, vec!["P1", "LIVING", "", "", "3"]);
        assert_eq!(o.field(2), Some(""));
        assert_eq!(o.field(7), None);
    }

    #[test]
    fn test_unterminated_object_is_parse_error() {
        let text = "Version,23.1;\n\nZone,\n    LIVING,\n    0\n";
        let err = Idf::parse(text, Path::new("in.idf")).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 3, .. }));

        let err = Idf::parse("Version,23.1;\n , x;\n", Path::new("in.idf")).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 2, .. }));
    }
}
