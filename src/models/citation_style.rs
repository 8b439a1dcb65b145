/// 引用格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationStyle {
    /// APA
    Apa,
    /// MLA（默认）
    Mla,
    /// Chicago
    Chicago,
}

/// 小写别名 → 引用格式
static STYLE_ALIASES: phf::Map<&'static str, CitationStyle> = phf::phf_map! {
    "apa" => CitationStyle::Apa,
    "apa7" => CitationStyle::Apa,
    "mla" => CitationStyle::Mla,
    "mla9" => CitationStyle::Mla,
    "chicago" => CitationStyle::Chicago,
    "turabian" => CitationStyle::Chicago,
};

impl CitationStyle {
    /// 大小写不敏感地解析；无法识别时使用 MLA
    pub fn parse(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase();
        STYLE_ALIASES.get(key.as_str()).copied().unwrap_or_default()
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            CitationStyle::Apa => "APA",
            CitationStyle::Mla => "MLA",
            CitationStyle::Chicago => "Chicago",
        }
    }

    /// 参考文献区块的标题
    pub fn bibliography_heading(self) -> &'static str {
        match self {
            CitationStyle::Apa => "References",
            CitationStyle::Chicago => "Bibliography",
            CitationStyle::Mla => "Works Cited",
        }
    }
}

impl Default for CitationStyle {
    fn default() -> Self {
        CitationStyle::Mla
    }
}

impl std::fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(CitationStyle::parse("apa"), CitationStyle::Apa);
        assert_eq!(CitationStyle::parse("Chicago"), CitationStyle::Chicago);
        assert_eq!(CitationStyle::parse(" MLA "), CitationStyle::Mla);
    }

    #[test]
    fn test_unknown_style_falls_back_to_mla() {
        assert_eq!(CitationStyle::parse("harvard"), CitationStyle::Mla);
        assert_eq!(CitationStyle::parse(""), CitationStyle::Mla);
    }

    #[test]
    fn test_bibliography_heading() {
        assert_eq!(CitationStyle::parse("apa").bibliography_heading(), "References");
        assert_eq!(CitationStyle::parse("Chicago").bibliography_heading(), "Bibliography");
        assert_eq!(CitationStyle::parse("MLA").bibliography_heading(), "Works Cited");
        assert_eq!(CitationStyle::parse("ieee").bibliography_heading(), "Works Cited");
    }
}
