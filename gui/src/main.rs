mod progress;
mod state;

use engine::{RecordId, RecordStatus, TargetChoice};
use iced::widget::{button, checkbox, column, container, row, scrollable, text};
use iced::{Alignment, Element, Length, Sandbox, Settings};
use progress::NoticeLevel;
use state::AppState;

pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    GuiApp::run(Settings::default())
}

#[derive(Debug, Clone)]
pub enum Message {
    SelectFilesPressed,
    SelectFolderPressed,
    ProcessPressed,
    ClearListPressed,
    ReplacePressed,
    SelectAllPressed,
    RemoveSelectedPressed,
    ClearSelectionPressed,
    InvertSelectionPressed,
    UseDefaultTargetToggled(bool),
    RecordSelected(RecordId, bool),
    StatusToggled(RecordId),
    PreviewRequested(RecordId),
}

pub struct GuiApp {
    state: AppState,
}

impl Sandbox for GuiApp {
    type Message = Message;

    fn new() -> Self {
        GuiApp {
            state: AppState::new(),
        }
    }

    fn title(&self) -> String {
        "Rehash - Batch Fingerprint Changer".to_string()
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::SelectFilesPressed => {
                if let Some(paths) = rfd::FileDialog::new().pick_files() {
                    self.state.add_files(paths);
                }
            }
            Message::SelectFolderPressed => {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    self.state.add_folder(dir);
                }
            }
            Message::ProcessPressed => {
                if self.state.use_default_target {
                    self.state.process(TargetChoice::Default);
                } else {
                    let mut dialog = rfd::FileDialog::new();
                    if let Some(dir) = self.state.source_directory() {
                        dialog = dialog.set_directory(dir);
                    }
                    if let Some(dir) = dialog.pick_folder() {
                        self.state.process(TargetChoice::Custom(dir));
                    }
                }
            }
            Message::ClearListPressed => self.state.clear(),
            Message::ReplacePressed => {
                if self.state.store.selection_count() == 0 {
                    self.state
                        .notify(progress::Notice::error("Select the files to replace first"));
                    return;
                }
                if let Some(paths) = rfd::FileDialog::new().pick_files() {
                    self.state.replace_selected(paths);
                }
            }
            Message::SelectAllPressed => self.state.store.select_all(),
            Message::RemoveSelectedPressed => self.state.remove_selected(),
            Message::ClearSelectionPressed => self.state.store.clear_selection(),
            Message::InvertSelectionPressed => self.state.store.invert_selection(),
            Message::UseDefaultTargetToggled(enabled) => {
                self.state.use_default_target = enabled;
            }
            Message::RecordSelected(id, selected) => self.state.set_selected(id, selected),
            Message::StatusToggled(id) => self.state.toggle_status(id),
            Message::PreviewRequested(id) => self.state.preview = Some(id),
        }
    }

    fn view(&self) -> Element<Message> {
        let toolbar = row![
            button("Select Files").on_press(Message::SelectFilesPressed),
            button("Select Folder").on_press(Message::SelectFolderPressed),
            button("Process").on_press_maybe(if self.state.store.is_empty() {
                None
            } else {
                Some(Message::ProcessPressed)
            }),
            button("Clear List").on_press(Message::ClearListPressed),
            checkbox("Use default target folder", self.state.use_default_target)
                .on_toggle(Message::UseDefaultTargetToggled),
        ]
        .spacing(10)
        .align_items(Alignment::Center);

        let record_actions = row![
            button("Replace").on_press(Message::ReplacePressed),
            button("Select All").on_press(Message::SelectAllPressed),
            button("Remove").on_press(Message::RemoveSelectedPressed),
            button("Clear Selection").on_press(Message::ClearSelectionPressed),
            button("Invert Selection").on_press(Message::InvertSelectionPressed),
        ]
        .spacing(10);

        let header = row![
            text("").width(Length::Fixed(30.0)),
            text("File Path").width(Length::FillPortion(4)),
            text("Original").width(Length::FillPortion(2)),
            text("New").width(Length::FillPortion(2)),
            text("Status").width(Length::Fixed(90.0)),
            text("Size").width(Length::Fixed(80.0)),
        ]
        .spacing(10);

        let mut list = column![].spacing(4);
        for record in self.state.store.records() {
            let id = record.id;
            let status_label = match record.status {
                RecordStatus::Pending => "Pending",
                RecordStatus::Done => "Done",
            };
            list = list.push(
                row![
                    checkbox("", record.selected)
                        .on_toggle(move |checked| Message::RecordSelected(id, checked))
                        .width(Length::Fixed(30.0)),
                    button(text(record.current_path().display().to_string()))
                        .on_press(Message::PreviewRequested(id))
                        .width(Length::FillPortion(4)),
                    text(record.original_fingerprint.hex()).width(Length::FillPortion(2)),
                    text(
                        record
                            .output_fingerprint
                            .as_ref()
                            .map(|c| c.hex())
                            .unwrap_or("")
                    )
                    .width(Length::FillPortion(2)),
                    button(status_label)
                        .on_press(Message::StatusToggled(id))
                        .width(Length::Fixed(90.0)),
                    text(record.size_display()).width(Length::Fixed(80.0)),
                ]
                .spacing(10)
                .align_items(Alignment::Center),
            );
        }

        let preview: Element<Message> = match self
            .state
            .preview
            .and_then(|id| self.state.store.get(id))
        {
            Some(record) => column![
                text(format!("File path: {}", record.current_path().display())),
                text(format!(
                    "{}: {}",
                    self.state.store.algorithm(),
                    record.original_fingerprint
                )),
            ]
            .spacing(5)
            .into(),
            None => text("Select a file to preview").into(),
        };

        let mut log = column![].spacing(2);
        for notice in self.state.notices.iter().rev().take(5) {
            let line = match notice.level {
                NoticeLevel::Info => notice.text.clone(),
                NoticeLevel::Error => format!("ERROR: {}", notice.text),
            };
            log = log.push(text(line));
        }

        let footer = match &self.state.last_target {
            Some(dir) => text(format!("Last target: {}", dir.display())),
            None => text(""),
        };

        column![
            text("Rehash").size(24),
            toolbar,
            record_actions,
            header,
            scrollable(list).height(Length::Fill),
            container(preview).padding(10),
            container(log).padding(10),
            footer,
        ]
        .spacing(15)
        .padding(20)
        .into()
    }
}
