/// Organism and protein description extracted from a hit title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub organism: String,
    pub protein: String,
}

/// 解析 `...>...|...| protein [Organism name]` 格式的標題。
///
/// 物種取最後一個 `[` 與其後第一個 `]` 之間的文字（轉小寫），
/// 蛋白描述則是把該 `[...]` 片段移除後的整段標題。
/// 找不到成對括號時物種為空字串、蛋白為原標題。
pub fn parse_title(title: &str) -> ParsedTitle {
    let bracket = title.rfind('[').and_then(|open| {
        title[open..]
            .find(']')
            .map(|close| (open, open + close))
    });

    match bracket {
        Some((open, close)) => {
            let bracketed = &title[open..=close];
            ParsedTitle {
                organism: title[open + 1..close].to_lowercase(),
                protein: title.replace(bracketed, ""),
            }
        }
        None => ParsedTitle {
            organism: String::new(),
            protein: title.to_string(),
        },
    }
}
