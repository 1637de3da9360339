//! Popup page renderer
//!
//! Owns one [`PopupModel`] for the lifetime of the popup window and paints
//! it into the static markup of `popup.html`. Rows and settings use event
//! delegation, so re-rendering never re-binds listeners.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement, KeyboardEvent};

use cw_core::lists::ListKey;
use cw_core::popup::{load, save_edit, PopupModel};
use cw_core::store::TermEdit;
use cw_core::view::{
    detail_fields, domain_label, expiry_label, meta_line, row_classes, truncate,
    VALUE_PREVIEW_CHARS,
};

use crate::chrome::Chrome;

fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element #{} has the wrong type", id)))
}

fn format_timestamp(secs: f64) -> String {
    js_sys::Date::new(&JsValue::from_f64(secs * 1000.0))
        .to_locale_string("default", &JsValue::UNDEFINED)
        .into()
}

struct Elements {
    site_domain: Element,
    total_count: Element,
    first_party_count: Element,
    third_party_count: Element,
    blacklist_count: Element,
    greylist_count: Element,
    cookie_list: Element,
    empty_state: HtmlElement,
    empty_message: Element,
    empty_hint: Element,
    error_state: HtmlElement,
    error_message: Element,
    search: HtmlInputElement,
    refresh: Element,
    settings_toggle: Element,
    settings_panel: HtmlElement,
}

impl Elements {
    fn find(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            site_domain: by_id(document, "site-domain")?,
            total_count: by_id(document, "total-count")?,
            first_party_count: by_id(document, "first-party-count")?,
            third_party_count: by_id(document, "third-party-count")?,
            blacklist_count: by_id(document, "blacklist-count")?,
            greylist_count: by_id(document, "greylist-count")?,
            cookie_list: by_id(document, "cookie-list")?,
            empty_state: by_id(document, "empty-state")?,
            empty_message: by_id(document, "empty-message")?,
            empty_hint: by_id(document, "empty-hint")?,
            error_state: by_id(document, "error-state")?,
            error_message: by_id(document, "error-message")?,
            search: by_id(document, "search")?,
            refresh: by_id(document, "refresh")?,
            settings_toggle: by_id(document, "settings-toggle")?,
            settings_panel: by_id(document, "settings-panel")?,
        })
    }
}

struct Popup {
    document: Document,
    els: Elements,
    model: RefCell<PopupModel>,
}

impl Popup {
    fn create(&self, tag: &str, class: &str, text: Option<&str>) -> Result<Element, JsValue> {
        let el = self.document.create_element(tag)?;
        if !class.is_empty() {
            el.set_class_name(class);
        }
        if text.is_some() {
            el.set_text_content(text);
        }
        Ok(el)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    fn reload(self: &Rc<Self>) {
        self.model.borrow_mut().begin_load();
        self.render_header();
        let this = Rc::clone(self);
        spawn_local(async move {
            let result = load(&Chrome).await;
            this.model.borrow_mut().finish_load(result);
            if let Err(e) = this.render() {
                log::error!("popup render failed: {:?}", e);
            }
        });
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render(&self) -> Result<(), JsValue> {
        self.render_header();
        self.render_list()?;
        self.render_settings()
    }

    fn render_header(&self) {
        let model = self.model.borrow();
        self.els.site_domain.set_text_content(Some(model.site_label()));
        let stats = model.stats();
        let set = |el: &Element, n: usize| el.set_text_content(Some(n.to_string().as_str()));
        set(&self.els.total_count, stats.total);
        set(&self.els.first_party_count, stats.first_party);
        set(&self.els.third_party_count, stats.third_party);
        set(&self.els.blacklist_count, stats.blacklisted);
        set(&self.els.greylist_count, stats.greylisted);
    }

    fn render_list(&self) -> Result<(), JsValue> {
        let model = self.model.borrow();
        self.els.cookie_list.set_inner_html("");

        if let Some(message) = model.error() {
            self.els.empty_state.set_hidden(true);
            self.els.error_state.set_hidden(false);
            self.els.error_message.set_text_content(Some(message));
            return Ok(());
        }
        self.els.error_state.set_hidden(true);

        match model.empty_state() {
            Some(empty) => {
                self.els.empty_state.set_hidden(false);
                self.els.empty_message.set_text_content(Some(empty.message()));
                self.els.empty_hint.set_text_content(Some(empty.hint()));
                return Ok(());
            }
            None => self.els.empty_state.set_hidden(true),
        }

        for (index, entry) in model.visible().into_iter().enumerate() {
            let cookie = &entry.cookie;
            let expanded = model.is_expanded(&entry.key());
            let mut class = row_classes(entry);
            if expanded {
                class.push_str(" expanded");
            }

            let li = self.create("li", &class, None)?;
            li.set_attribute("data-index", &index.to_string())?;

            let name = self.create("div", "cookie-name", Some(cookie.name.as_str()))?;
            name.set_attribute("title", &cookie.name)?;
            li.append_child(&name)?;

            let meta = self.create("div", "cookie-meta", None)?;
            let domain = self.create("span", "", Some(domain_label(cookie)))?;
            domain.set_attribute("title", "Domain")?;
            meta.append_child(&domain)?;
            let expires = format!("Expires: {}", expiry_label(cookie, format_timestamp));
            meta.append_child(&self.create("span", "", Some(expires.as_str()))?.into())?;
            li.append_child(&meta)?;

            li.append_child(&self.create("div", "cookie-meta", Some(meta_line(cookie).as_str()))?.into())?;

            let wrap = self.create("div", "cookie-value-wrap", None)?;
            let preview = truncate(&cookie.value, VALUE_PREVIEW_CHARS);
            wrap.append_child(&self.create("span", "cookie-value", Some(preview.as_ref()))?.into())?;
            li.append_child(&wrap)?;

            if expanded {
                let details = self.create("dl", "cookie-details", None)?;
                for (label, value) in detail_fields(cookie, format_timestamp) {
                    details.append_child(&self.create("dt", "", Some(label))?.into())?;
                    details.append_child(&self.create("dd", "", Some(value.as_str()))?.into())?;
                }
                li.append_child(&details)?;
            }

            self.els.cookie_list.append_child(&li)?;
        }
        Ok(())
    }

    fn render_settings(&self) -> Result<(), JsValue> {
        let model = self.model.borrow();
        let panel = &self.els.settings_panel;
        panel.set_inner_html("");

        if let Some(message) = model.settings_error() {
            panel.append_child(&self.create("p", "settings-error", Some(message))?.into())?;
        }

        for key in ListKey::ALL {
            let section = self.create("section", "term-list", None)?;
            section.append_child(&self.create("h3", "", Some(key.label()))?.into())?;

            let ul = self.create("ul", "terms", None)?;
            for term in model.lists().get(key).iter() {
                let li = self.create("li", "term", None)?;
                li.append_child(&self.create("span", "term-text", Some(term))?.into())?;
                let remove = self.create("button", "term-remove", Some("×"))?;
                remove.set_attribute("data-action", "remove")?;
                remove.set_attribute("data-key", key.storage_key())?;
                remove.set_attribute("data-term", term)?;
                li.append_child(&remove)?;
                ul.append_child(&li)?;
            }
            section.append_child(&ul)?;

            let input = self.create("input", "term-input", None)?;
            input.set_attribute("type", "text")?;
            input.set_attribute("placeholder", "Add term…")?;
            input.set_attribute("data-key", key.storage_key())?;
            section.append_child(&input)?;

            let add = self.create("button", "term-add", Some("Add"))?;
            add.set_attribute("data-action", "add")?;
            add.set_attribute("data-key", key.storage_key())?;
            section.append_child(&add)?;

            panel.append_child(&section)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Interaction
    // -------------------------------------------------------------------------

    fn on_list_click(&self, event: &Event) -> Result<(), JsValue> {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return Ok(());
        };
        // Leave the detail panel selectable
        if target.closest(".cookie-details")?.is_some() {
            return Ok(());
        }
        let Some(row) = target.closest("li.cookie-item")? else {
            return Ok(());
        };
        let index = row
            .get_attribute("data-index")
            .and_then(|i| i.parse::<usize>().ok());
        let key = {
            let model = self.model.borrow();
            index.and_then(|i| model.visible().get(i).map(|e| e.key()))
        };
        if let Some(key) = key {
            self.model.borrow_mut().toggle_expanded(&key);
            self.render_list()?;
        }
        Ok(())
    }

    fn on_settings_click(self: &Rc<Self>, event: &Event) -> Result<(), JsValue> {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return Ok(());
        };
        let Some(key) = target
            .get_attribute("data-key")
            .and_then(|k| ListKey::from_storage_key(&k))
        else {
            return Ok(());
        };
        match target.get_attribute("data-action").as_deref() {
            Some("remove") => {
                if let Some(term) = target.get_attribute("data-term") {
                    self.edit(key, TermEdit::Remove(term))?;
                }
            }
            Some("add") => self.add_from_input(key)?,
            _ => {}
        }
        Ok(())
    }

    fn on_settings_keydown(self: &Rc<Self>, event: &KeyboardEvent) -> Result<(), JsValue> {
        if event.key() != "Enter" {
            return Ok(());
        }
        let key = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.get_attribute("data-key"))
            .and_then(|k| ListKey::from_storage_key(&k));
        if let Some(key) = key {
            event.prevent_default();
            self.add_from_input(key)?;
        }
        Ok(())
    }

    fn add_from_input(self: &Rc<Self>, key: ListKey) -> Result<(), JsValue> {
        let selector = format!("input[data-key=\"{}\"]", key.storage_key());
        let input = self
            .els
            .settings_panel
            .query_selector(&selector)?
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
        if let Some(input) = input {
            let term = input.value();
            self.edit(key, TermEdit::Add(term))?;
        }
        Ok(())
    }

    /// Apply locally and re-render now, then write through to storage and
    /// adopt the list as stored.
    fn edit(self: &Rc<Self>, key: ListKey, edit: TermEdit) -> Result<(), JsValue> {
        if self.model.borrow_mut().edit_term(key, &edit).is_none() {
            return Ok(());
        }
        self.render()?;

        let this = Rc::clone(self);
        spawn_local(async move {
            match save_edit(&Chrome, key, &edit).await {
                Ok(list) => {
                    this.model.borrow_mut().apply_saved_list(key, list);
                    report(this.render());
                }
                Err(e) => {
                    log::warn!("saving {} failed: {}", key.storage_key(), e);
                    this.model.borrow_mut().set_settings_error(Some(e.to_string()));
                    report(this.render_settings());
                }
            }
        });
        Ok(())
    }
}

fn listen<F>(target: &Element, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the popup document
    closure.forget();
    Ok(())
}

fn report(result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::error!("popup handler failed: {:?}", e);
    }
}

/// Wire up the popup page and start the first load.
pub fn start() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document"))?;
    let els = Elements::find(&document)?;
    els.settings_panel.set_hidden(true);

    let popup = Rc::new(Popup {
        document,
        els,
        model: RefCell::new(PopupModel::new()),
    });

    let p = Rc::clone(&popup);
    listen(&popup.els.search, "input", move |_| {
        let query = p.els.search.value();
        p.model.borrow_mut().set_query(&query);
        p.render_header();
        report(p.render_list());
    })?;

    let p = Rc::clone(&popup);
    listen(&popup.els.refresh, "click", move |_| p.reload())?;

    let p = Rc::clone(&popup);
    listen(&popup.els.cookie_list, "click", move |event| {
        report(p.on_list_click(&event))
    })?;

    let p = Rc::clone(&popup);
    listen(&popup.els.settings_toggle, "click", move |_| {
        let panel = &p.els.settings_panel;
        panel.set_hidden(!panel.hidden());
    })?;

    let p = Rc::clone(&popup);
    listen(&popup.els.settings_panel, "click", move |event| {
        report(p.on_settings_click(&event))
    })?;

    let p = Rc::clone(&popup);
    listen(&popup.els.settings_panel, "keydown", move |event| {
        if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
            report(p.on_settings_keydown(event));
        }
    })?;

    popup.reload();
    Ok(())
}
