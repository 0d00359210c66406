//! HTML标签提取器
//! 负责从HTML中提取script-src、内联脚本文本与meta标签
//! 提取永不失败：畸形文档只产出空/部分证据

use std::cell::RefCell;
use std::collections::HashMap;

use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::tokenizer::states::RawKind;
use markup5ever::interface::Attribute;
use tendril::StrTendril;

/// 单个页面的可匹配证据
#[derive(Debug, Default, Clone)]
pub struct Evidence {
    /// 原始响应体（htmlContent通道直接匹配）
    pub raw_body: String,
    /// script标签src属性，文档序
    pub script_srcs: Vec<String>,
    /// 内联脚本文本，文档序（空串是合法条目，不过滤）
    pub inline_js: Vec<String>,
    /// meta标签属性展平后的映射（后出现的同名属性覆盖先出现的）
    pub meta_tags: HashMap<String, String>,
}

impl Evidence {
    /// 从响应体构建证据（包含一次完整的HTML标签提取）
    pub fn from_body(body: String) -> Self {
        let extracted = HtmlExtractor::new().extract(&body);
        Self {
            raw_body: body,
            script_srcs: extracted.script_srcs.into_inner(),
            inline_js: extracted.inline_js.into_inner(),
            meta_tags: extracted.meta_tags.into_inner(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor {
    script_srcs: RefCell<Vec<String>>,
    inline_js: RefCell<Vec<String>>,
    meta_tags: RefCell<HashMap<String, String>>,
    // script元素内部时累积字符Token
    in_script: RefCell<bool>,
    script_text: RefCell<String>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(Tag {
                kind: TagKind::StartTag,
                name,
                self_closing,
                attrs,
            }) => match name.as_ref() {
                "script" => {
                    self.extract_script_src(&attrs);
                    if self_closing {
                        // 自闭合script没有文本内容，记一条空串占位
                        self.inline_js.borrow_mut().push(String::new());
                        return TokenSinkResult::Continue;
                    }
                    *self.in_script.borrow_mut() = true;
                    self.script_text.borrow_mut().clear();
                    // 切换tokenizer到脚本原始文本状态，保证内容按字符流出
                    return TokenSinkResult::RawData(RawKind::ScriptData);
                }
                "meta" => self.extract_meta_tags(&attrs),
                _ => {}
            },
            Token::TagToken(Tag {
                kind: TagKind::EndTag,
                name,
                ..
            }) => {
                if name.as_ref() == "script" && *self.in_script.borrow() {
                    let text = std::mem::take(&mut *self.script_text.borrow_mut());
                    self.inline_js.borrow_mut().push(text);
                    *self.in_script.borrow_mut() = false;
                }
            }
            Token::CharacterTokens(text) => {
                if *self.in_script.borrow() {
                    self.script_text.borrow_mut().push_str(&text);
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

impl HtmlExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从HTML字符串提取标签
    pub fn extract(self, html: &str) -> Self {
        let tokenizer = Tokenizer::new(self, TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        let sink = tokenizer.sink;
        // 文档截断在script内部时，已累积的文本仍计为一条内联脚本
        if *sink.in_script.borrow() {
            let text = std::mem::take(&mut *sink.script_text.borrow_mut());
            sink.inline_js.borrow_mut().push(text);
            *sink.in_script.borrow_mut() = false;
        }
        sink
    }

    /// 提取script-src（无src属性的script元素跳过）
    fn extract_script_src(&self, attrs: &[Attribute]) {
        for attr in attrs {
            if attr.name.local.as_ref() == "src" {
                self.script_srcs.borrow_mut().push(attr.value.to_string());
                break;
            }
        }
    }

    /// 提取meta标签：所有属性展平为 属性名→属性值
    fn extract_meta_tags(&self, attrs: &[Attribute]) {
        let mut meta_tags = self.meta_tags.borrow_mut();
        for attr in attrs {
            meta_tags.insert(
                attr.name.local.as_ref().to_string(),
                attr.value.to_string(),
            );
        }
    }
}
