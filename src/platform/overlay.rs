//! DOM overlay
//!
//! The overlay root doubles as the WebXR `dom-overlay` root, so everything in
//! here stays visible on top of the camera feed during the session.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlAnchorElement, HtmlButtonElement, HtmlElement, HtmlInputElement};

use crate::consts::{CODE_BORDER, CODE_BORDER_ERROR, INSTRUCTION_TEXT, SUBTITLE_TEXT, TITLE_TEXT};
use crate::sim::ButtonView;

const OVERLAY_ID: &str = "overlay";
const END_SCREEN_ID: &str = "endScreen";

const TITLE_STYLE: &str = "position:fixed;top:20%;left:50%;transform:translateX(-50%);width:90%;\
    text-align:center;color:#15F4EE;font-size:28px;font-weight:bold;\
    text-shadow:0 0 10px rgba(21,244,238,0.8);font-family:'MyCustomFont',MoreSugar-Regular";
const SUBTITLE_STYLE: &str = "position:fixed;top:30%;left:50%;transform:translateX(-50%);width:80%;\
    text-align:center;color:white;font-size:16px;font-family:'MyCustomFont',MoreSugar-Regular";
const BUTTON_STYLE: &str = "position:fixed;bottom:20px;left:50%;transform:translateX(-50%);\
    padding:12px 6px;width:140px;border:1px solid #fff;border-radius:4px;background:rgba(0,0,0,0.1);\
    color:#fff;font:normal 13px sans-serif;text-align:center;opacity:0.5;outline:none;z-index:999;\
    text-decoration:none";
const DISTANCE_STYLE: &str = "position:fixed;top:10px;left:10px;background:rgba(0,0,0,0.7);color:white;\
    padding:10px;border-radius:5px;font-family:Arial,sans-serif;z-index:999";
const INSTRUCTION_STYLE: &str = "position:fixed;top:8%;left:50%;transform:translateX(-50%);width:100%;\
    color:#15F4EE;font-size:18px;font-weight:bold;text-align:center;\
    text-shadow:0 0 5px rgba(21,244,238,0.8);font-family:'MyCustomFont',MoreSugar-Regular";
const CODE_INPUT_STYLE: &str = "position:fixed;top:12%;left:50%;transform:translateX(-50%);width:80%;\
    max-width:400px;padding:10px;background:rgba(0,0,0,0.8);color:#15F4EE;border:2px solid #15F4EE;\
    border-radius:10px;font-size:20px;font-weight:bold;text-align:center;outline:none;\
    box-shadow:0 0 15px rgba(21,244,238,0.8);font-family:'MyCustomFont',MoreSugar-Regular";

/// Overlay elements created at startup
pub struct Overlay {
    document: Document,
    root: HtmlElement,
    title: HtmlElement,
    subtitle: HtmlElement,
    button: HtmlButtonElement,
    link: Option<HtmlAnchorElement>,
    distance: HtmlElement,
    instruction: HtmlElement,
    code_input: HtmlInputElement,
}

fn create<T: JsCast>(document: &Document, tag: &str, id: &str, style: &str) -> Result<T, JsValue> {
    let el = document.create_element(tag)?;
    el.set_id(id);
    el.set_attribute("style", style)?;
    el.dyn_into::<T>().map_err(JsValue::from)
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    let _ = el.style().set_property(property, value);
}

impl Overlay {
    /// Build the overlay under `#overlay` (created if the page has none)
    pub fn build(document: &Document) -> Result<Self, JsValue> {
        let root: HtmlElement = match document.get_element_by_id(OVERLAY_ID) {
            Some(el) => el.dyn_into().map_err(JsValue::from)?,
            None => {
                let root: HtmlElement = create(document, "div", OVERLAY_ID, "")?;
                let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;
                body.append_child(&root)?;
                root
            }
        };

        let title: HtmlElement = create(document, "div", "heading", TITLE_STYLE)?;
        title.set_text_content(Some(TITLE_TEXT));

        let subtitle: HtmlElement = create(document, "div", "subheading", SUBTITLE_STYLE)?;
        subtitle.set_text_content(Some(SUBTITLE_TEXT));

        let button: HtmlButtonElement = create(document, "button", "ar-button", BUTTON_STYLE)?;
        set_style(&button, "display", "none");

        let distance: HtmlElement = create(document, "div", "distance-ui", DISTANCE_STYLE)?;
        distance.set_text_content(Some("Distance: Calculating..."));
        set_style(&distance, "visibility", "hidden");

        let instruction: HtmlElement = create(document, "div", "instruction-text", INSTRUCTION_STYLE)?;
        instruction.set_text_content(Some(INSTRUCTION_TEXT));
        set_style(&instruction, "visibility", "hidden");

        let code_input: HtmlInputElement = create(document, "input", "text-input", CODE_INPUT_STYLE)?;
        code_input.set_type("text");
        code_input.set_attribute("inputmode", "numeric")?;
        code_input.set_attribute("autocomplete", "off")?;
        set_style(&code_input, "visibility", "hidden");

        for el in [&title, &subtitle, &distance, &instruction] {
            root.append_child(el)?;
        }
        root.append_child(&code_input)?;
        root.append_child(&button)?;

        Ok(Self {
            document: document.clone(),
            root,
            title,
            subtitle,
            button,
            link: None,
            distance,
            instruction,
            code_input,
        })
    }

    /// Root element handed to the session as its DOM overlay
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn button(&self) -> &HtmlButtonElement {
        &self.button
    }

    pub fn code_input(&self) -> &HtmlInputElement {
        &self.code_input
    }

    pub fn show_button(&mut self, view: &ButtonView) {
        match view {
            ButtonView::Hidden => set_style(&self.button, "display", "none"),
            ButtonView::Active { label } => {
                self.button.set_text_content(Some(*label));
                self.button.set_disabled(false);
                set_style(&self.button, "display", "");
                set_style(&self.button, "cursor", "pointer");
            }
            ButtonView::Disabled { label } => {
                self.button.set_text_content(Some(*label));
                self.button.set_disabled(true);
                set_style(&self.button, "display", "");
                set_style(&self.button, "cursor", "auto");
            }
            ButtonView::Link { label, href } => {
                set_style(&self.button, "display", "none");
                if self.link.is_none() {
                    self.link = create::<HtmlAnchorElement>(&self.document, "a", "ar-link", BUTTON_STYLE)
                        .and_then(|a| self.root.append_child(&a).map(|_| a))
                        .map_err(|e| log::error!("Failed to create AR link: {:?}", e))
                        .ok();
                }
                if let Some(link) = &self.link {
                    link.set_href(href);
                    link.set_text_content(Some(*label));
                }
            }
        }
    }

    pub fn set_intro_visible(&self, visible: bool) {
        let display = if visible { "" } else { "none" };
        set_style(&self.title, "display", display);
        set_style(&self.subtitle, "display", display);
    }

    pub fn show_distance(&self) {
        set_style(&self.distance, "visibility", "visible");
    }

    pub fn set_distance(&self, text: &str) {
        self.distance.set_text_content(Some(text));
    }

    pub fn reveal_code_entry(&self) {
        set_style(&self.code_input, "visibility", "visible");
        set_style(&self.instruction, "visibility", "visible");
        let _ = self.code_input.focus();
    }

    pub fn hide_code_entry(&self) {
        set_style(&self.code_input, "visibility", "hidden");
        set_style(&self.instruction, "visibility", "hidden");
    }

    /// Replace the field with the formatted code, caret at the end
    pub fn set_code_display(&self, text: &str) {
        self.code_input.set_value(text);
        let end = text.len() as u32;
        let _ = self.code_input.set_selection_range(end, end);
    }

    /// Red border that reverts after `ms`
    pub fn flash_code_error(&self, ms: u32) {
        set_style(&self.code_input, "border-color", CODE_BORDER_ERROR);

        let Some(window) = web_sys::window() else { return };
        let input = self.code_input.clone();
        let revert = Closure::once_into_js(move || {
            set_style(&input, "border-color", CODE_BORDER);
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(revert.unchecked_ref(), ms as i32);
    }

    pub fn show_end_screen(&self) {
        self.set_end_screen_display("flex");
    }

    fn set_end_screen_display(&self, display: &str) {
        match self.document.get_element_by_id(END_SCREEN_ID) {
            Some(el) => {
                let _ = el.set_attribute("style", &format!("display:{}", display));
            }
            None => log::warn!("No #{} element on the page", END_SCREEN_ID),
        }
    }

    /// Back to the pre-session look after the AR session ends
    pub fn session_ended(&self) {
        set_style(&self.distance, "visibility", "hidden");
        self.distance.set_text_content(Some("Distance: Calculating..."));
        self.code_input.set_value("");
        self.hide_code_entry();
        self.set_end_screen_display("none");
    }
}
